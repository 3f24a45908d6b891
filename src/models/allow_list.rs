use std::collections::HashSet;
use std::path::Path;

use cssparser::{
    AtRuleParser, CowRcStr, ParseError, Parser, ParserInput, ParserState, QualifiedRuleParser,
    StyleSheetParser, Token,
};

use crate::error::ConfigError;

/// At-rules whose blocks hold ordinary style rules.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "layer", "container", "document"];

/// Class and id names the style sheet gives meaning to.
///
/// Built once at startup and shared read-only by every job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    classes: HashSet<String>,
    ids: HashSet<String>,
}

impl AllowList {
    pub fn new<C, I>(classes: C, ids: I) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Collects the class and id tokens of every selector in `css`.
    ///
    /// Declarations are skipped, so hex colours never register as ids.
    /// Escaped identifiers such as `.sm\:flex` register unescaped.
    pub fn from_css(css: &str) -> Self {
        let mut allow = AllowList::default();
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut collector = RuleCollector { allow: &mut allow };
        for result in StyleSheetParser::new(&mut parser, &mut collector) {
            // Unparseable rules are skipped
            let _ = result;
        }
        allow
    }

    /// Reads and parses a style sheet; an unreadable or selector-free file is an error
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let css = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let allow = Self::from_css(&css);
        if allow.is_empty() {
            return Err(ConfigError::EmptyAllowList {
                path: path.display().to_string(),
            });
        }
        Ok(allow)
    }

    pub fn allows_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn allows_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.ids.is_empty()
    }
}

struct RuleCollector<'a> {
    allow: &'a mut AllowList,
}

impl<'i> AtRuleParser<'i> for RuleCollector<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        if GROUPING_AT_RULES.iter().any(|rule| name.eq_ignore_ascii_case(rule)) {
            while input.next().is_ok() {}
            Ok(())
        } else {
            Err(input.new_custom_error(()))
        }
    }

    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(())
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        for result in StyleSheetParser::new(input, self) {
            let _ = result;
        }
        Ok(())
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleCollector<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        collect_selector_tokens(input, self.allow);
        Ok(())
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        while input.next().is_ok() {}
        Ok(())
    }
}

/// `.name` and `#name` tokens, descending into pseudo-class arguments.
/// Attribute selectors are not entered, so quoted values never register.
fn collect_selector_tokens<'i>(input: &mut Parser<'i, '_>, allow: &mut AllowList) {
    let mut after_dot = false;
    while let Ok(token) = input.next_including_whitespace() {
        let token = token.clone();
        match &token {
            Token::Ident(name) if after_dot => {
                allow.classes.insert(name.to_string());
            }
            Token::IDHash(name) => {
                allow.ids.insert(name.to_string());
            }
            Token::Function(_) | Token::ParenthesisBlock => {
                let _ = input.parse_nested_block(|nested| {
                    collect_selector_tokens(nested, allow);
                    Ok::<_, ParseError<'i, ()>>(())
                });
            }
            _ => {}
        }
        after_dot = matches!(token, Token::Delim('.'));
    }
}
