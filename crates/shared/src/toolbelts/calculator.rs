// crates/shared/src/toolbelts/calculator.rs
use anyhow::{bail, Result};
use serde_json::{Map, Value};

use crate::register_toolbelt;

const ALLOWED: &str = "0123456789+-*/.() ";
const MAX_EXPRESSION_LEN: usize = 1024;
const MAX_DEPTH: usize = 64;

#[derive(Default)]
pub struct Calculator;

register_toolbelt! {
    Calculator {
        description: "Basic arithmetic",
        tools: {
            "calculate" => calculate {
                description: "Evaluate a math expression and return the result.",
                params: [
                    "expression": "string" => "A math expression, e.g. '2 + 2 * 3'"
                ]
            }
        }
    }
}

impl Calculator {
    fn calculate(&self, args: &Map<String, Value>) -> Result<String> {
        let expression = args.get("expression").and_then(Value::as_str).unwrap_or("");
        if !expression.chars().all(|c| ALLOWED.contains(c)) {
            return Ok("Error: only basic math operations are allowed".to_string());
        }
        if expression.len() > MAX_EXPRESSION_LEN {
            return Ok(format!(
                "Error: expression longer than {} characters",
                MAX_EXPRESSION_LEN
            ));
        }

        match evaluate(expression) {
            Ok(result) => Ok(format_number(result)),
            Err(e) => Ok(format!("Error: {}", e)),
        }
    }
}

/// Evaluates `+ - * /`, unary minus and parentheses over decimal numbers.
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        bail!("empty expression");
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if let Some(token) = parser.peek() {
        bail!("unexpected '{}'", token);
    }
    Ok(value)
}

/// Whole results print without a trailing `.0` (`4/2` gives `2`, not `2.0`).
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Op(c) => write!(f, "{}", c),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("invalid number '{}'", literal))?;
                tokens.push(Token::Number(number));
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => bail!("unexpected character '{}'", other),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    // unary signs and open parentheses currently being parsed
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    bail!("division by zero");
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    // factor := ('+' | '-') factor | number | '(' expression ')'
    fn factor(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Op('-')) => Ok(-self.nested(Self::factor)?),
            Some(Token::Op('+')) => self.nested(Self::factor),
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.nested(Self::expression)?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => bail!("missing closing parenthesis"),
                }
            }
            Some(token) => bail!("unexpected '{}'", token),
            None => bail!("unexpected end of expression"),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<f64>) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            bail!("expression nested too deeply");
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_precedence_and_parentheses() {
        assert_eq!(evaluate("42 * 17 + 3").unwrap(), 717.0);
        assert_eq!(evaluate("2 + 2 * 3").unwrap(), 8.0);
        assert_eq!(evaluate("(2 + 2) * 3").unwrap(), 12.0);
        assert_eq!(evaluate("-4 + 10 / 4").unwrap(), -1.5);
    }

    #[test]
    fn reports_bad_input() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("1.2.3").is_err());
    }

    #[test]
    fn tool_rejects_non_arithmetic_characters() {
        let calc = Calculator;
        let mut args = Map::new();
        args.insert("expression".into(), Value::from("__import__('os')"));
        assert_eq!(
            calc.calculate(&args).unwrap(),
            "Error: only basic math operations are allowed"
        );

        args.insert("expression".into(), Value::from("7 / 2"));
        assert_eq!(calc.calculate(&args).unwrap(), "3.5");

        args.insert("expression".into(), Value::from("5 / (3 - 3)"));
        assert_eq!(calc.calculate(&args).unwrap(), "Error: division by zero");

        args.insert("expression".into(), Value::from("4 / 2"));
        assert_eq!(calc.calculate(&args).unwrap(), "2");
    }

    #[test]
    fn deep_nesting_is_an_error_result() {
        assert_eq!(
            evaluate(&format!("{}1", "-".repeat(MAX_DEPTH + 1))).unwrap_err().to_string(),
            "expression nested too deeply"
        );
        assert_eq!(
            evaluate(&format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1)))
                .unwrap_err()
                .to_string(),
            "expression nested too deeply"
        );
        assert_eq!(evaluate(&format!("{}1", "-".repeat(MAX_DEPTH))).unwrap(), 1.0);
        assert_eq!(evaluate("--(-(2))").unwrap(), -2.0);
    }

    #[test]
    fn huge_expressions_do_not_reach_the_parser() {
        let registry = crate::registry::ToolRegistry::builder()
            .toolbelt(Calculator)
            .build()
            .unwrap();

        let long_unary = serde_json::json!({ "expression": format!("{}1", "-".repeat(200_000)) });
        let outcome = registry.invoke("calculate", &long_unary.to_string());
        assert!(outcome.text().starts_with("Error:"), "got {}", outcome);

        let parens = "(".repeat(500) + "1" + &")".repeat(500);
        let outcome = registry.invoke("calculate", &serde_json::json!({ "expression": parens }).to_string());
        assert_eq!(outcome.text(), "Error: expression nested too deeply");
    }
}
