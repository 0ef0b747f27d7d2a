use super::{lexer::Token, parser::Postfix};

/// Evaluate a postfix query against already-lowercased search text.
///
/// Missing operands read as `false`; an empty final stack reads as `true`,
/// so degenerate queries match everything.
pub fn eval_text(postfix: &Postfix, text: &str) -> bool {
    let mut stack: Vec<bool> = Vec::new();

    for tok in postfix.tokens() {
        match tok {
            Token::Term(term) => stack.push(term.is_empty() || text.contains(term.as_str())),
            Token::Not => {
                let a = stack.pop().unwrap_or(false);
                stack.push(!a);
            }
            Token::And => {
                let b = stack.pop().unwrap_or(false);
                let a = stack.pop().unwrap_or(false);
                stack.push(a && b);
            }
            Token::Or => {
                let b = stack.pop().unwrap_or(false);
                let a = stack.pop().unwrap_or(false);
                stack.push(a || b);
            }
            Token::LParen | Token::RParen => {}
        }
    }

    stack.last().copied().unwrap_or(true)
}
