// crates/shared/src/macros.rs

/// Declares the tools a toolbelt struct exposes and implements
/// [`Toolbelt`](crate::registry::Toolbelt) for it.
///
/// Parameters are required unless prefixed with `#[optional]`. Each listed
/// method takes `&serde_json::Map<String, Value>` and returns
/// `anyhow::Result<T>` for any `T: Into<serde_json::Value>`.
#[macro_export]
macro_rules! register_toolbelt {
    (@required) => { true };
    (@required optional) => { false };
    (
        $toolbelt_type:ident {
            description: $toolbelt_desc:literal,
            tools: {
                $(
                    $name:literal => $method:ident {
                        description: $desc:literal,
                        params: [$($(#[$opt:ident])? $param_name:literal: $param_type:literal => $param_desc:literal),* $(,)?]
                    }
                ),* $(,)?
            }
        }
    ) => {
        impl $crate::registry::Toolbelt for $toolbelt_type {
            fn name(&self) -> &'static str {
                stringify!($toolbelt_type)
            }

            fn description(&self) -> &'static str {
                $toolbelt_desc
            }

            fn specs(&self) -> Vec<$crate::schemas::ToolSpec> {
                vec![
                    $(
                        $crate::schemas::ToolSpec {
                            name: $name.to_string(),
                            description: $desc.to_string(),
                            parameters: vec![
                                $(
                                    $crate::schemas::ParameterSpec {
                                        name: $param_name.to_string(),
                                        type_name: $param_type.to_string(),
                                        description: $param_desc.to_string(),
                                        required: $crate::register_toolbelt!(@required $($opt)?),
                                    }
                                ),*
                            ],
                        }
                    ),*
                ]
            }

            fn call(
                &self,
                tool: &str,
                args: &serde_json::Map<String, serde_json::Value>,
            ) -> Option<anyhow::Result<serde_json::Value>> {
                match tool {
                    $($name => Some(self.$method(args).map(serde_json::Value::from)),)*
                    _ => None,
                }
            }
        }
    };
}
