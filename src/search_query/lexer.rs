#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A lowercased word or quoted phrase.
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Term(t) => write!(f, "{t:?}"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Split a raw query into tokens and insert implicit `And`s.
///
/// Never fails: an unterminated quote runs to the end of input.
pub fn tokenize(input: &str) -> Vec<Token> {
    insert_implicit_and(scan(input))
}

fn scan(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        match chars[i] {
            c if is_separator(c) => {
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' => {
                let phrase = read_quoted(&chars, &mut i);
                tokens.push(Token::Term(phrase.to_lowercase()));
            }
            _ => {
                let word = read_word(&chars, &mut i);
                let token = match word.to_uppercase().as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Term(word.to_lowercase()),
                };
                tokens.push(token);
            }
        }
    }

    tokens
}

// Unicode whitespace plus the ASCII file/group/record/unit separators
// (U+001C..=U+001F), which `char::is_whitespace` leaves out.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn read_quoted(chars: &[char], i: &mut usize) -> String {
    *i += 1; // skip opening quote
    let mut s = String::new();
    while *i < chars.len() {
        if chars[*i] == '"' {
            *i += 1; // skip closing quote
            return s;
        }
        s.push(chars[*i]);
        *i += 1;
    }
    s
}

// Quotes inside a word are kept: `foo"bar` is a single word.
fn read_word(chars: &[char], i: &mut usize) -> String {
    let mut word = String::new();
    while *i < chars.len() {
        match chars[*i] {
            c if is_separator(c) => break,
            '(' | ')' => break,
            c => {
                word.push(c);
                *i += 1;
            }
        }
    }
    word
}

/// `a b` → `a AND b`, `a (b)` → `a AND (b)`, `a NOT b` → `a AND NOT b`.
fn insert_implicit_and(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut iter = tokens.into_iter().peekable();

    while let Some(tok) = iter.next() {
        let left_closes = matches!(tok, Token::Term(_) | Token::RParen);
        out.push(tok);

        if left_closes
            && matches!(
                iter.peek(),
                Some(Token::Term(_) | Token::LParen | Token::Not)
            )
        {
            out.push(Token::And);
        }
    }

    out
}
