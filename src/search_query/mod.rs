mod eval;
mod lexer;
mod parser;

pub use eval::eval_text;
pub use lexer::{tokenize, Token};
pub use parser::{to_postfix, Postfix};

/// Anything that can be searched and filtered by tag.
pub trait Record {
    fn title(&self) -> &str;
    fn url(&self) -> &str;
    fn description(&self) -> &str;
    fn tags(&self) -> &[String];

    /// Lowercased `title url description tags...`, single-space separated.
    fn search_text(&self) -> String {
        let tags = self.tags().join(" ");
        [self.title(), self.url(), self.description(), tags.as_str()]
            .join(" ")
            .to_lowercase()
    }
}

/// Parse a query into postfix form.
///
/// Never fails. Malformed input degrades instead of erroring:
/// - empty / whitespace-only → empty sequence (matches everything)
/// - unmatched `(` or `)` → dropped
/// - unterminated quote → phrase runs to end of input
pub fn parse(query: &str) -> Postfix {
    to_postfix(tokenize(query))
}

/// Evaluate a parsed query against one record.
pub fn eval<R: Record + ?Sized>(postfix: &Postfix, record: &R) -> bool {
    eval_text(postfix, &record.search_text())
}

/// Convenience: parse + evaluate in one call.
pub fn matches<R: Record + ?Sized>(record: &R, query: &str) -> bool {
    eval(&parse(query), record)
}
