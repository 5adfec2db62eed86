//! Marker lexer for the persisted token formats.
//!
//! Turns decoded file text into a flat token stream: control sequences,
//! group braces, and text runs. Comments (`%` to end of line, including
//! the line break) disappear here, which is what makes the layout
//! comments in the written files invisible to the parser. Whitespace
//! directly after a named control sequence is consumed, TeX-style; all
//! other text is kept verbatim.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `\name` where the name is letters and `@`, or a single other
    /// character after the backslash.
    ControlSeq(String),
    BeginGroup,
    EndGroup,
    Text(String),
}

impl Token {
    /// Rendering used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::ControlSeq(name) => format!("\\{name}"),
            Self::BeginGroup => "{".to_string(),
            Self::EndGroup => "}".to_string(),
            Self::Text(text) => text.trim().to_string(),
        }
    }

    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = input.chars().peekable();

    let flush = |tokens: &mut Vec<Token>, text: &mut String| {
        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(text)));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                flush(&mut tokens, &mut text);
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '\\' => {
                flush(&mut tokens, &mut text);
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphabetic() || next == '@' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    if let Some(single) = chars.next() {
                        name.push(single);
                    }
                } else {
                    // TeX eats whitespace after a named control sequence.
                    while chars.peek().is_some_and(|next| next.is_whitespace()) {
                        chars.next();
                    }
                }
                tokens.push(Token::ControlSeq(name));
            }
            '{' => {
                flush(&mut tokens, &mut text);
                tokens.push(Token::BeginGroup);
            }
            '}' => {
                flush(&mut tokens, &mut text);
                tokens.push(Token::EndGroup);
            }
            _ => text.push(c),
        }
    }
    flush(&mut tokens, &mut text);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_sequences_and_groups() {
        let tokens = tokenize(r"\DTLdbProvideData{marks}");
        assert_eq!(
            tokens,
            vec![
                Token::ControlSeq("DTLdbProvideData".to_string()),
                Token::BeginGroup,
                Token::Text("marks".to_string()),
                Token::EndGroup,
            ]
        );
    }

    #[test]
    fn comments_eat_the_line_break() {
        let tokens = tokenize("{% Header\nabc}");
        assert_eq!(
            tokens,
            vec![
                Token::BeginGroup,
                Token::Text("abc".to_string()),
                Token::EndGroup,
            ]
        );
    }

    #[test]
    fn at_signs_belong_to_names() {
        let tokens = tokenize(r"\db@col@id@w 1\db@col@id@end@");
        assert_eq!(
            tokens,
            vec![
                Token::ControlSeq("db@col@id@w".to_string()),
                Token::Text("1".to_string()),
                Token::ControlSeq("db@col@id@end@".to_string()),
            ]
        );
    }

    #[test]
    fn whitespace_after_named_sequence_is_eaten() {
        let tokens = tokenize("\\DTLdbNewRow\n\\DTLdbNewEntry");
        assert_eq!(
            tokens,
            vec![
                Token::ControlSeq("DTLdbNewRow".to_string()),
                Token::ControlSeq("DTLdbNewEntry".to_string()),
            ]
        );
    }

    #[test]
    fn single_char_control_sequence() {
        let tokens = tokenize(r"a\%b");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".to_string()),
                Token::ControlSeq("%".to_string()),
                Token::Text("b".to_string()),
            ]
        );
    }
}
