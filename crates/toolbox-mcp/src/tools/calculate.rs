//! Tool: calculate — Evaluate an arithmetic expression.
//!
//! Only digits, `.`, `+ - * /`, parentheses and whitespace are accepted.
//! Evaluation is a small recursive-descent parser; nothing is ever executed.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

const MAX_DEPTH: usize = 64;

#[derive(Debug, Deserialize)]
struct CalculateParams {
    expression: String,
}

/// Return the tool definition for calculate.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "calculate".to_string(),
        description: Some("Evaluate an arithmetic expression (+, -, *, /, parentheses)".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "expression": { "type": "string", "description": "Expression such as (2 + 3) * 4" }
            },
            "required": ["expression"]
        }),
    }
}

/// Execute the calculate tool.
pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: CalculateParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let value = evaluate(&params.expression)?;
    Ok(ToolCallResult::text(format_number(value)))
}

/// Evaluate `expression` to a finite number.
pub fn evaluate(expression: &str) -> McpResult<f64> {
    if let Some(bad) = expression
        .chars()
        .find(|c| !(c.is_ascii_digit() || c.is_whitespace() || "+-*/().".contains(*c)))
    {
        return Err(McpError::ToolExecution(format!(
            "Invalid character '{bad}' in expression"
        )));
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(McpError::ToolExecution("Expression is empty".to_string()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(McpError::ToolExecution(
            "Unexpected input after expression".to_string(),
        ));
    }
    if !value.is_finite() {
        return Err(McpError::ToolExecution("Result is not a finite number".to_string()));
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> McpResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
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
                let number = literal.parse::<f64>().map_err(|_| {
                    McpError::ToolExecution(format!("Invalid number '{literal}'"))
                })?;
                tokens.push(Token::Number(number));
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> McpResult<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> McpResult<f64> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == Token::Star {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(McpError::ToolExecution("Division by zero".to_string()));
                }
                value / rhs
            };
        }
        Ok(value)
    }

    // factor := ('+' | '-') factor | number | '(' expr ')'
    fn factor(&mut self) -> McpResult<f64> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(McpError::ToolExecution("Expression is nested too deeply".to_string()));
        }

        let value = match self.next() {
            Some(Token::Number(n)) => n,
            Some(Token::Minus) => -self.factor()?,
            Some(Token::Plus) => self.factor()?,
            Some(Token::LParen) => {
                let inner = self.expr()?;
                if self.next() != Some(Token::RParen) {
                    return Err(McpError::ToolExecution("Missing closing parenthesis".to_string()));
                }
                inner
            }
            Some(token) => {
                return Err(McpError::ToolExecution(format!("Unexpected token {token:?}")))
            }
            None => return Err(McpError::ToolExecution("Unexpected end of expression".to_string())),
        };

        self.depth -= 1;
        Ok(value)
    }
}
