//! Lowering of concrete expression trees to [`Expression`] nodes

use crate::error::{ParseResult, SourcePosition, WdlError};
use crate::expr::{decode_escapes, Expression, Placeholder, StringPart, StringQuote};
use crate::parser::cst::{ConcreteChild, ConcreteNode, ConcreteToken, Meta, Rule, TokenKind};
use crate::parser::keywords::KeywordSet;
use indexmap::IndexMap;

/// Placeholder options a string may set
const PLACEHOLDER_OPTIONS: &[&str] = &["default", "false", "true", "sep"];

/// Dialects without `<<< >>>` strings
const NO_MULTI_LINE_STRINGS: &[&str] = &["draft-2", "1.0", "1.1"];

/// Expression lowering for one parse.
///
/// With a keyword set, user-chosen names inside expressions (bare
/// identifiers, members, struct names and keys) are checked against it.
#[derive(Debug, Clone, Copy)]
pub struct ExprLowerer<'a> {
    uri: &'a str,
    abspath: &'a str,
    version: &'a str,
    declared: Option<&'a str>,
    keywords: Option<&'a KeywordSet>,
}

impl<'a> ExprLowerer<'a> {
    pub fn new(uri: &'a str, abspath: &'a str, version: &'a str, declared: Option<&'a str>) -> Self {
        Self {
            uri,
            abspath,
            version,
            declared,
            keywords: None,
        }
    }

    /// Check names against `keywords`
    pub fn with_keywords(mut self, keywords: &'a KeywordSet) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn version(&self) -> &'a str {
        self.version
    }

    /// Source position of a node or token
    pub fn sp(&self, meta: Meta) -> SourcePosition {
        SourcePosition::new(
            self.uri.to_string(),
            self.abspath.to_string(),
            meta.line,
            meta.column,
            meta.end_line,
            meta.end_column,
        )
    }

    pub fn syntax_error(&self, pos: SourcePosition, message: String) -> WdlError {
        WdlError::syntax_error(
            pos,
            message,
            self.version.to_string(),
            self.declared.map(str::to_string),
        )
    }

    /// Reject `name` if it is reserved in the active dialect
    pub fn check_keyword(&self, pos: &SourcePosition, name: &str) -> ParseResult<()> {
        match self.keywords {
            Some(keywords) if keywords.contains(name) => {
                Err(self.syntax_error(pos.clone(), format!("unexpected keyword {}", name)))
            }
            _ => Ok(()),
        }
    }

    /// Error for a tree the grammar can't produce
    pub fn malformed(&self, node: &ConcreteNode) -> WdlError {
        WdlError::validation_error(
            self.sp(node.meta),
            format!("malformed {:?} node in concrete tree", node.rule),
        )
    }

    /// The `index`th child of `node`, which must be a token
    pub fn token_at<'n>(
        &self,
        node: &'n ConcreteNode,
        index: usize,
    ) -> ParseResult<&'n ConcreteToken> {
        match node.children.get(index) {
            Some(ConcreteChild::Token(token)) => Ok(token),
            _ => Err(self.malformed(node)),
        }
    }

    /// The `index`th child of `node`, which must be a node
    pub fn node_at<'n>(&self, node: &'n ConcreteNode, index: usize) -> ParseResult<&'n ConcreteNode> {
        match node.children.get(index) {
            Some(ConcreteChild::Node(child)) => Ok(child),
            _ => Err(self.malformed(node)),
        }
    }

    /// Lower every node child from `skip` on as an expression
    fn lower_all(&self, node: &ConcreteNode, skip: usize) -> ParseResult<Vec<Expression>> {
        node.children
            .iter()
            .skip(skip)
            .map(|child| match child {
                ConcreteChild::Node(child) => self.lower(child),
                ConcreteChild::Token(_) => Err(self.malformed(node)),
            })
            .collect()
    }

    /// Lower an expression node
    pub fn lower(&self, node: &ConcreteNode) -> ParseResult<Expression> {
        let pos = self.sp(node.meta);
        match node.rule {
            Rule::BooleanTrue => Ok(Expression::boolean(pos, true)),
            Rule::BooleanFalse => Ok(Expression::boolean(pos, false)),
            Rule::Null => Ok(Expression::null(pos)),
            Rule::Int => {
                let text = &self.token_at(node, 0)?.text;
                let value = text.parse::<i64>().map_err(|_| {
                    self.syntax_error(pos.clone(), "integer literal out of range".to_string())
                })?;
                Ok(Expression::int(pos, value))
            }
            Rule::Float => {
                let text = &self.token_at(node, 0)?.text;
                let value = text.parse::<f64>().map_err(|_| self.malformed(node))?;
                Ok(Expression::float(pos, value))
            }
            Rule::String => self.lower_string(node, pos),
            Rule::Array => Ok(Expression::array(pos, self.lower_all(node, 0)?)),
            Rule::Pair => {
                let left = self.lower(self.node_at(node, 0)?)?;
                let right = self.lower(self.node_at(node, 1)?)?;
                Ok(Expression::pair(pos, left, right))
            }
            Rule::Map => {
                let pairs = node
                    .children
                    .iter()
                    .map(|child| match child {
                        ConcreteChild::Node(kv) if kv.rule == Rule::MapKv => Ok((
                            self.lower(self.node_at(kv, 0)?)?,
                            self.lower(self.node_at(kv, 1)?)?,
                        )),
                        _ => Err(self.malformed(node)),
                    })
                    .collect::<ParseResult<Vec<_>>>()?;
                Ok(Expression::map(pos, pairs))
            }
            Rule::Obj => self.lower_object(node, pos),
            Rule::IfThenElse => {
                let condition = self.lower(self.node_at(node, 0)?)?;
                let true_expr = self.lower(self.node_at(node, 1)?)?;
                let false_expr = self.lower(self.node_at(node, 2)?)?;
                Ok(Expression::if_then_else(pos, condition, true_expr, false_expr))
            }
            Rule::LeftName => {
                let name = self.token_at(node, 0)?.text.clone();
                self.check_keyword(&pos, &name)?;
                Ok(Expression::get(
                    pos.clone(),
                    Expression::left_name(pos, name),
                    None,
                ))
            }
            Rule::GetName => {
                let base = self.lower(self.node_at(node, 0)?)?;
                let member = self.token_at(node, 1)?.text.clone();
                if member != "left" && member != "right" {
                    self.check_keyword(&pos, &member)?;
                }
                Ok(Expression::get(pos, base, Some(member)))
            }
            Rule::Apply => {
                let name = self.token_at(node, 0)?.text.clone();
                Ok(Expression::apply(pos, name, self.lower_all(node, 1)?))
            }
            Rule::Negate => Ok(Expression::apply(
                pos,
                "_negate".to_string(),
                self.lower_all(node, 0)?,
            )),
            Rule::At => Ok(Expression::apply(pos, "_at".to_string(), self.lower_all(node, 0)?)),
            Rule::Lor
            | Rule::Land
            | Rule::Eqeq
            | Rule::Neq
            | Rule::Lt
            | Rule::Lte
            | Rule::Gt
            | Rule::Gte
            | Rule::Add
            | Rule::Sub
            | Rule::Mul
            | Rule::Div
            | Rule::Rem => {
                let operands = self.lower_all(node, 0)?;
                if operands.len() != 2 {
                    return Err(self.malformed(node));
                }
                Ok(Expression::apply(pos, infix_function(node.rule), operands))
            }
            Rule::Placeholder
            | Rule::PlaceholderOption
            | Rule::StringLiteral
            | Rule::MapKv
            | Rule::ObjectKv
            | Rule::Type
            | Rule::UnboundDecl
            | Rule::BoundDecl
            | Rule::InputDecls
            | Rule::NoninputDecl
            | Rule::Command
            | Rule::OutputDecls
            | Rule::RuntimeSection
            | Rule::RuntimeKv
            | Rule::MetaSection
            | Rule::MetaObject
            | Rule::MetaKv
            | Rule::MetaArray
            | Rule::Task
            | Rule::Tasks
            | Rule::NamespacedIdent
            | Rule::Call
            | Rule::CallAlias
            | Rule::CallAfter
            | Rule::CallInputs
            | Rule::InputColon
            | Rule::CallInput
            | Rule::Scatter
            | Rule::Conditional
            | Rule::WorkflowOutputDecls
            | Rule::OutputIdent
            | Rule::Workflow
            | Rule::Struct
            | Rule::Import
            | Rule::ImportAs
            | Rule::ImportAlias
            | Rule::Version
            | Rule::Document => Err(self.malformed(node)),
        }
    }

    /// Lower the text and placeholders of a string or command body. Text is
    /// validated for escapes when `validate` is set, but kept as written.
    pub fn lower_parts<'n>(
        &self,
        children: impl Iterator<Item = &'n ConcreteChild>,
        validate: Option<&SourcePosition>,
    ) -> ParseResult<Vec<StringPart>> {
        children
            .map(|child| match child {
                ConcreteChild::Token(token) => {
                    if let Some(pos) = validate {
                        decode_escapes(pos, &token.text)?;
                    }
                    Ok(StringPart::Text(token.text.clone()))
                }
                ConcreteChild::Node(node) if node.rule == Rule::Placeholder => {
                    Ok(StringPart::Placeholder(self.lower_placeholder(node)?))
                }
                ConcreteChild::Node(node) => Ok(StringPart::Placeholder(Placeholder::new(
                    self.sp(node.meta),
                    IndexMap::new(),
                    self.lower(node)?,
                ))),
            })
            .collect()
    }

    fn lower_string(&self, node: &ConcreteNode, pos: SourcePosition) -> ParseResult<Expression> {
        let count = node.children.len();
        if count < 2 {
            return Err(self.malformed(node));
        }
        let open = self.token_at(node, 0)?;
        let close = self.token_at(node, count - 1)?;
        if open.kind != TokenKind::Delimiter || close.kind != TokenKind::Delimiter {
            return Err(self.malformed(node));
        }

        let body = node.children[1..count - 1].iter();
        let parts = self.lower_parts(body, Some(&pos))?;

        match open.text.as_str() {
            "<<<" => {
                if NO_MULTI_LINE_STRINGS.contains(&self.version) {
                    return Err(self.syntax_error(
                        pos,
                        "<<< multi-line strings >>> are not supported in this WDL version"
                            .to_string(),
                    ));
                }
                Ok(Expression::multi_line_string(pos, parts))
            }
            "'" => Ok(Expression::string(pos, StringQuote::Single, parts)),
            _ => Ok(Expression::string(pos, StringQuote::Double, parts)),
        }
    }

    /// Lower `~{opt=value ... expr}`
    pub fn lower_placeholder(&self, node: &ConcreteNode) -> ParseResult<Placeholder> {
        let pos = self.sp(node.meta);
        let (expr, options) = match node.children.split_last() {
            Some((ConcreteChild::Node(expr), options)) => (expr, options),
            _ => return Err(self.malformed(node)),
        };

        let mut seen = IndexMap::new();
        for option in options {
            let option = match option {
                ConcreteChild::Node(option) if option.rule == Rule::PlaceholderOption => option,
                _ => return Err(self.malformed(node)),
            };
            let (name, value) = self.lower_placeholder_option(option)?;
            if seen.insert(name, value).is_some() {
                return Err(WdlError::multiple_definitions(
                    pos,
                    "duplicate options in expression placeholder".to_string(),
                ));
            }
        }

        Ok(Placeholder::new(pos, seen, self.lower(expr)?))
    }

    fn lower_placeholder_option(&self, node: &ConcreteNode) -> ParseResult<(String, String)> {
        let name = &self.token_at(node, 0)?.text;
        if !PLACEHOLDER_OPTIONS.contains(&name.as_str()) {
            return Err(WdlError::validation_error(
                self.sp(node.meta),
                "unknown placeholder option".to_string(),
            ));
        }
        let value = self.node_at(node, 1)?;
        let value = match value.rule {
            Rule::StringLiteral => self.lower_string_literal(value)?,
            Rule::Int | Rule::Float => self.token_at(value, 0)?.text.clone(),
            _ => return Err(self.malformed(node)),
        };
        Ok((name.clone(), value))
    }

    /// Decode a placeholder-free string literal to its value
    pub fn lower_string_literal(&self, node: &ConcreteNode) -> ParseResult<String> {
        let raw: String = node
            .children
            .iter()
            .filter_map(|child| match child {
                ConcreteChild::Token(token) if token.kind == TokenKind::Text => {
                    Some(token.text.as_str())
                }
                _ => None,
            })
            .collect();
        decode_escapes(&self.sp(node.meta), &raw)
    }

    fn lower_object(&self, node: &ConcreteNode, pos: SourcePosition) -> ParseResult<Expression> {
        // A leading word names the struct type; `object` leaves it anonymous.
        let (type_name, entries) = match node.children.split_first() {
            Some((ConcreteChild::Token(name), rest)) => {
                let type_name = if name.text == "object" {
                    None
                } else {
                    self.check_keyword(&pos, &name.text)?;
                    Some(name.text.clone())
                };
                (type_name, rest)
            }
            _ => (None, node.children.as_slice()),
        };

        let members = entries
            .iter()
            .map(|child| match child {
                ConcreteChild::Node(kv) if kv.rule == Rule::ObjectKv => self.lower_object_kv(kv),
                _ => Err(self.malformed(node)),
            })
            .collect::<ParseResult<Vec<_>>>()?;
        Ok(Expression::struct_literal(pos, members, type_name))
    }

    fn lower_object_kv(&self, node: &ConcreteNode) -> ParseResult<(String, Expression)> {
        let key = match node.children.first() {
            Some(ConcreteChild::Token(token)) => token.text.clone(),
            Some(ConcreteChild::Node(literal)) if literal.rule == Rule::StringLiteral => {
                self.lower_string_literal(literal)?
            }
            _ => return Err(self.malformed(node)),
        };
        self.check_keyword(&self.sp(node.meta), &key)?;
        let value = self.lower(self.node_at(node, 1)?)?;
        Ok((key, value))
    }
}

/// Synthetic function name of an infix operator rule
fn infix_function(rule: Rule) -> String {
    let name = match rule {
        Rule::Lor => "_lor",
        Rule::Land => "_land",
        Rule::Eqeq => "_eqeq",
        Rule::Neq => "_neq",
        Rule::Lt => "_lt",
        Rule::Lte => "_lte",
        Rule::Gt => "_gt",
        Rule::Gte => "_gte",
        Rule::Add => "_add",
        Rule::Sub => "_sub",
        Rule::Mul => "_mul",
        Rule::Div => "_div",
        _ => "_rem",
    };
    name.to_string()
}
