use super::lexer::Token;

/// A query in postfix (RPN) order. Never contains parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Postfix(Vec<Token>);

impl Postfix {
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn precedence(tok: &Token) -> u8 {
    match tok {
        Token::Not => 3,
        Token::And => 2,
        Token::Or => 1,
        _ => 0,
    }
}

fn is_left_assoc(tok: &Token) -> bool {
    !matches!(tok, Token::Not)
}

/// Shunting-yard conversion to postfix.
///
/// Unbalanced parentheses are tolerated: a stray `)` stops popping and a
/// leftover `(` is dropped at the end.
pub fn to_postfix(tokens: Vec<Token>) -> Postfix {
    let mut output = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Token> = Vec::new();

    for tok in tokens {
        match tok {
            Token::Term(_) => output.push(tok),
            Token::LParen => ops.push(tok),
            Token::RParen => {
                while let Some(top) = ops.pop() {
                    if top == Token::LParen {
                        break;
                    }
                    output.push(top);
                }
            }
            Token::And | Token::Or | Token::Not => {
                while let Some(top) = ops.last() {
                    if !top.is_operator() {
                        break;
                    }
                    let (p_top, p_tok) = (precedence(top), precedence(&tok));
                    if p_top > p_tok || (p_top == p_tok && is_left_assoc(&tok)) {
                        if let Some(top) = ops.pop() {
                            output.push(top);
                        }
                    } else {
                        break;
                    }
                }
                ops.push(tok);
            }
        }
    }

    while let Some(top) = ops.pop() {
        if top != Token::LParen {
            output.push(top);
        }
    }

    Postfix(output)
}
