use super::ast::{CmpOp, Expr, Value};
use crate::error::ConditionError;

/// Parses a condition string into an [`Expr`].
///
/// Grammar, loosest binding first:
///
/// ```text
/// expr := and ( ("or" | "||") and )*
/// and  := not ( ("and" | "&&") not )*
/// not  := ("not" | "!") not | cmp
/// cmp  := term ( ("==" | "!=" | ">" | ">=" | "<" | "<=" | "contains") term )?
/// term := number | string | true | false | null | ident | "(" expr ")"
/// ```
pub fn parse(source: &str) -> Result<Expr, ConditionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error(format!(
            "unexpected trailing input at token {}",
            parser.pos + 1
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Op(CmpOp),
    Contains,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == quote {
                        closed = true;
                        break;
                    }
                    text.push(ch);
                }
                if !closed {
                    return Err(parse_error(source, "unterminated string literal"));
                }
                tokens.push(Token::Str(text));
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Op(CmpOp::Eq));
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(CmpOp::Neq));
                } else {
                    tokens.push(Token::Not);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(CmpOp::Gte));
                } else {
                    tokens.push(Token::Op(CmpOp::Gt));
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(CmpOp::Lte));
                } else {
                    tokens.push(Token::Op(CmpOp::Lt));
                }
            }
            '&' => {
                chars.next();
                if chars.next() != Some('&') {
                    return Err(parse_error(source, "expected '&&'"));
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.next() != Some('|') {
                    return Err(parse_error(source, "expected '||'"));
                }
                tokens.push(Token::Or);
            }
            _ if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number: f64 = text
                    .parse()
                    .map_err(|_| parse_error(source, &format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(number));
            }
            _ if c.is_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '.' {
                        word.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(keyword_or_ident(word));
            }
            other => {
                return Err(parse_error(
                    source,
                    &format!("unexpected character '{}'", other),
                ));
            }
        }
    }
    Ok(tokens)
}

fn keyword_or_ident(word: String) -> Token {
    match word.as_str() {
        "and" | "AND" => Token::And,
        "or" | "OR" => Token::Or,
        "not" | "NOT" => Token::Not,
        "contains" => Token::Contains,
        "true" => Token::Ident("true".to_string()),
        "false" => Token::Ident("false".to_string()),
        "null" => Token::Ident("null".to_string()),
        _ => Token::Ident(word),
    }
}

fn parse_error(source: &str, message: &str) -> ConditionError {
    ConditionError::Parse {
        expr: source.to_string(),
        message: message.to_string(),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: String) -> ConditionError {
        ConditionError::Parse {
            expr: self.source.to_string(),
            message,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ConditionError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Expr, ConditionError> {
        let left = self.parse_term()?;
        match self.peek() {
            Some(Token::Op(op)) => {
                let op = *op;
                self.advance();
                let right = self.parse_term()?;
                Ok(Expr::Compare(op, Box::new(left), Box::new(right)))
            }
            Some(Token::Contains) => {
                self.advance();
                let right = self.parse_term()?;
                Ok(Expr::Contains(Box::new(left), Box::new(right)))
            }
            _ => Ok(left),
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ConditionError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Ident(word)) => Ok(match word.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                _ => Expr::Var(word),
            }),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if self.advance() != Some(Token::RParen) {
                    return Err(self.error("expected ')'".to_string()));
                }
                Ok(inner)
            }
            Some(other) => Err(self.error(format!("unexpected token {:?}", other))),
            None => Err(self.error("unexpected end of condition".to_string())),
        }
    }
}
