use strum_macros::EnumDiscriminants;

use crate::error::{ScriptError, ScriptResult};

#[derive(PartialEq, Clone, Debug, EnumDiscriminants)]
#[strum_discriminants(name(TokenTypeVariant))]
pub enum TokenType {
    LeftParen,
    RightParen,
    Comma,
    Dot,
    Semicolon,
    Symbol(char),

    Keyword(String),
    Identifier(String),
    QuotedIdentifier(String),
    String(String),
    Number(String),
    Comment(String),

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: String,
    pub line: u32,
    pub col: u32,
    /// Char offsets of the lexeme within the scanned source.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn variant(&self) -> TokenTypeVariant {
        TokenTypeVariant::from(&self.kind)
    }

    pub fn is_comment(&self) -> bool {
        self.variant() == TokenTypeVariant::Comment
    }
}

pub struct Scanner {
    source_chars: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    col: u32,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source_chars: source.chars().collect(),
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokens(&self) -> &Vec<Token> {
        &self.tokens
    }

    /// Source text between two char offsets.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.source_chars[start..end].iter().collect()
    }

    fn advance(&mut self) -> char {
        let c = self.source_chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source_chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source_chars[self.current]
        }
    }

    fn peek_next(&self) -> char {
        self.source_chars
            .get(self.current + 1)
            .copied()
            .unwrap_or('\0')
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        };
        self.advance();
        true
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.tokens.push(Token {
            kind: token_type,
            lexeme: self.current_source_str(),
            line: self.line,
            col: self.col,
            start: self.start,
            end: self.current,
        });
    }

    fn current_source_str(&self) -> String {
        self.source_chars[self.start..self.current].iter().collect()
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.start = 0;
        self.current = 0;
        self.col = 1;
        self.line = 1;
    }

    pub fn scan(&mut self) -> ScriptResult<()> {
        self.reset();
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.start = self.current;
        self.tokens.push(Token {
            kind: TokenType::Eof,
            lexeme: String::from("eof"),
            line: self.line,
            col: self.col,
            start: self.current,
            end: self.current,
        });
        Ok(())
    }

    fn error(&self, message: &str) -> ScriptError {
        ScriptError::scan(self.line, self.col, message)
    }

    fn match_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
        let comment = self.current_source_str();
        self.add_token(TokenType::Comment(comment));
    }

    fn match_block_comment(&mut self) -> ScriptResult<()> {
        loop {
            if self.is_at_end() {
                return Err(self.error("Found unterminated block comment."));
            }
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
        let comment = self.current_source_str();
        self.add_token(TokenType::Comment(comment));
        Ok(())
    }

    fn match_string(&mut self, delimiter: char) -> ScriptResult<String> {
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(self.error("Found unterminated string."));
            }
            let c = self.advance();
            if c == delimiter {
                // Doubled delimiter escapes itself
                if self.peek() == delimiter {
                    value.push(self.advance());
                    continue;
                }
                break;
            }
            if c == '\\' && delimiter == '\'' && !self.is_at_end() {
                value.push(c);
                value.push(self.advance());
                continue;
            }
            value.push(c);
        }
        Ok(value)
    }

    fn match_dollar_string(&mut self) -> ScriptResult<()> {
        // Opening `$$` already consumed
        loop {
            if self.is_at_end() {
                return Err(self.error("Found unterminated $$ string."));
            }
            if self.peek() == '$' && self.peek_next() == '$' {
                self.advance();
                self.advance();
                break;
            }
            self.advance();
        }
        let body: String = self.source_chars[self.start + 2..self.current - 2]
            .iter()
            .collect();
        self.add_token(TokenType::String(body));
        Ok(())
    }

    fn match_number(&mut self) {
        let mut found_dot = false;
        let mut found_e = false;
        loop {
            let peek_char = self.peek();
            if peek_char == '.' && !found_dot && !found_e {
                found_dot = true;
                self.advance();
            } else if (peek_char == 'e' || peek_char == 'E') && !found_e {
                let next = self.peek_next();
                if next.is_ascii_digit() || next == '+' || next == '-' {
                    found_e = true;
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else if peek_char.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        let number = self.current_source_str();
        self.add_token(TokenType::Number(number));
    }

    fn match_keyword_or_identifier(&mut self) {
        loop {
            let peek_char = self.peek();
            if !(peek_char.is_alphanumeric() || peek_char == '_' || peek_char == '$') {
                break;
            }
            self.advance();
        }
        let word = self.current_source_str();
        let lowered = word.to_lowercase();
        if is_keyword(&lowered) {
            self.add_token(TokenType::Keyword(lowered));
        } else {
            self.add_token(TokenType::Identifier(word));
        }
    }

    fn scan_token(&mut self) -> ScriptResult<()> {
        let curr_char = self.advance();
        match curr_char {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.match_number();
                } else {
                    self.add_token(TokenType::Dot);
                }
            }
            '-' => {
                if self.match_char('-') {
                    self.match_line_comment();
                } else {
                    self.add_token(TokenType::Symbol('-'));
                }
            }
            '/' => {
                if self.match_char('*') {
                    self.match_block_comment()?;
                } else if self.match_char('/') {
                    self.match_line_comment();
                } else {
                    self.add_token(TokenType::Symbol('/'));
                }
            }
            '$' => {
                if self.match_char('$') {
                    self.match_dollar_string()?;
                } else {
                    self.add_token(TokenType::Symbol('$'));
                }
            }
            '\'' => {
                let value = self.match_string('\'')?;
                self.add_token(TokenType::String(value));
            }
            '"' | '`' => {
                let value = self.match_string(curr_char)?;
                if value.is_empty() {
                    return Err(self.error("Found empty quoted identifier."));
                }
                self.add_token(TokenType::QuotedIdentifier(value));
            }
            c if c.is_whitespace() => {}
            c if c.is_ascii_digit() => self.match_number(),
            c if c.is_alphabetic() || c == '_' => self.match_keyword_or_identifier(),
            c => self.add_token(TokenType::Symbol(c)),
        }
        Ok(())
    }
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "all"
            | "alter"
            | "and"
            | "as"
            | "asc"
            | "begin"
            | "between"
            | "by"
            | "call"
            | "case"
            | "clone"
            | "cluster"
            | "comment"
            | "commit"
            | "copy"
            | "create"
            | "cross"
            | "database"
            | "default"
            | "delete"
            | "desc"
            | "describe"
            | "distinct"
            | "drop"
            | "else"
            | "end"
            | "except"
            | "exists"
            | "external"
            | "false"
            | "file"
            | "format"
            | "from"
            | "full"
            | "function"
            | "grant"
            | "group"
            | "having"
            | "if"
            | "in"
            | "inner"
            | "insert"
            | "intersect"
            | "into"
            | "is"
            | "join"
            | "lateral"
            | "left"
            | "like"
            | "limit"
            | "materialized"
            | "merge"
            | "not"
            | "null"
            | "on"
            | "or"
            | "order"
            | "outer"
            | "over"
            | "partition"
            | "procedure"
            | "qualify"
            | "recursive"
            | "replace"
            | "revoke"
            | "right"
            | "role"
            | "rollback"
            | "schema"
            | "secure"
            | "select"
            | "sequence"
            | "set"
            | "show"
            | "stage"
            | "table"
            | "task"
            | "temp"
            | "temporary"
            | "then"
            | "to"
            | "transient"
            | "true"
            | "truncate"
            | "union"
            | "unset"
            | "update"
            | "use"
            | "using"
            | "values"
            | "view"
            | "volatile"
            | "warehouse"
            | "when"
            | "where"
            | "with"
    )
}

/// One statement's slice of a script, as split on top-level semicolons.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatement {
    /// Everything since the previous statement, leading comments and tags included.
    pub text: String,
    /// Isolated sql; leading comments removed, trimmed, trailing `;` stripped.
    pub sql: String,
    /// Char offset of the first sql token within `text`.
    pub sql_start: usize,
    /// Char offset within the script just past the statement.
    pub end: usize,
}

impl RawStatement {
    /// Text above the statement's sql, where tags and markers live.
    pub fn leading(&self) -> String {
        self.text.chars().take(self.sql_start).collect()
    }
}

/// Splits a script into statements; chunks holding only comments are dropped.
pub fn split_statements(source: &str) -> ScriptResult<Vec<RawStatement>> {
    let mut scanner = Scanner::new(source);
    scanner.scan()?;

    let mut statements = vec![];
    let mut chunk_start = 0;
    let mut first_sql_token: Option<&Token> = None;

    for token in scanner.tokens() {
        match token.kind {
            TokenType::Semicolon | TokenType::Eof => {
                if let Some(first) = first_sql_token {
                    let text = scanner.slice(chunk_start, token.end);
                    let sql = scanner.slice(first.start, token.end);
                    let sql = sql.trim().trim_end_matches(';').trim_end().to_owned();
                    statements.push(RawStatement {
                        text,
                        sql,
                        sql_start: first.start - chunk_start,
                        end: token.end,
                    });
                    chunk_start = token.end;
                } else if token.kind == TokenType::Semicolon {
                    // A bare `;` still closes the chunk
                    chunk_start = token.end;
                }
                first_sql_token = None;
            }
            _ if token.is_comment() => {}
            _ => {
                if first_sql_token.is_none() {
                    first_sql_token = Some(token);
                }
            }
        }
    }

    log::debug!("Split source into {} statement(s)", statements.len());
    Ok(statements)
}

/// Keywords ending the part of a line that names what a statement acts on.
const CLAUSE_KEYWORDS: [&str; 7] = ["where", "on", "order", "group", "having", "qualify", "limit"];

fn word_value(token: &Token) -> Option<&str> {
    match &token.kind {
        TokenType::Identifier(ident) | TokenType::QuotedIdentifier(ident) => Some(ident.as_str()),
        _ => None,
    }
}

/// Identifier groups of a line: dotted names joined (`db.sch.tbl`), each
/// followed by its alias when one is given (`sample_table as s`).
///
/// Collection stops at the first clause keyword (`where`, `on`, ...).
/// Keywords listed in `keep` are returned as groups of their own, and a
/// line containing one of them is read to its end.
pub fn identifiers(line: &str, keep: &[&str]) -> ScriptResult<Vec<String>> {
    let mut scanner = Scanner::new(line);
    scanner.scan()?;
    let tokens: Vec<&Token> = scanner
        .tokens()
        .iter()
        .filter(|token| !token.is_comment())
        .collect();
    let is_kept = |token: &Token| matches!(&token.kind, TokenType::Keyword(kw) if keep.contains(&kw.as_str()));
    let stop_at_clauses = !tokens.iter().any(|&token| is_kept(token));

    let mut groups: Vec<String> = vec![];
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if is_kept(token) {
            groups.push(token.lexeme.to_lowercase());
            i += 1;
            continue;
        }
        if let TokenType::Keyword(kw) = &token.kind {
            if stop_at_clauses && CLAUSE_KEYWORDS.contains(&kw.as_str()) {
                break;
            }
        }
        let Some(first) = word_value(token) else {
            i += 1;
            continue;
        };

        let mut group = first.to_owned();
        i += 1;
        while let (Some(dot), Some(part)) = (tokens.get(i), tokens.get(i + 1).and_then(|t| word_value(t))) {
            if dot.kind != TokenType::Dot {
                break;
            }
            group.push('.');
            group.push_str(part);
            i += 2;
        }

        let has_as = matches!(tokens.get(i).map(|t| &t.kind), Some(TokenType::Keyword(kw)) if kw == "as");
        let alias_at = if has_as { i + 1 } else { i };
        let alias = tokens.get(alias_at).and_then(|t| word_value(t));
        let alias_is_bare = !matches!(tokens.get(alias_at + 1).map(|t| &t.kind), Some(TokenType::Dot));
        if let (Some(alias), true) = (alias, alias_is_bare) {
            if has_as {
                group.push_str(" as");
            }
            group.push(' ');
            group.push_str(alias);
            i = alias_at + 1;
        }
        groups.push(group);
    }
    Ok(groups)
}
