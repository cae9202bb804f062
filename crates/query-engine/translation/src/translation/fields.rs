//! Resolve dotted field names to columns, JSON paths and array elements.

use query_engine_metadata::metadata::{FieldDefinition, ID_FIELD};
use query_engine_sql::sql;

use super::helpers::{Env, Scope};

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A path inside a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath(pub Vec<PathSegment>);

impl JsonPath {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.0.first()
    }

    /// Segments of a dotted remainder. Numeric segments index into arrays.
    pub fn from_segments(segments: &[&str]) -> JsonPath {
        JsonPath(
            segments
                .iter()
                .map(|segment| match segment.parse::<usize>() {
                    Ok(index) => PathSegment::Index(index),
                    Err(_) => PathSegment::Key((*segment).to_string()),
                })
                .collect(),
        )
    }

    /// The SQLite and MySQL form, e.g. `$.address.city` or `$.tags[0]`.
    pub fn to_dollar_path(&self) -> String {
        let mut path = String::from("$");
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    path.push('.');
                    path.push_str(key);
                }
                PathSegment::Key(key) => {
                    path.push_str(".\"");
                    path.push_str(key);
                    path.push('"');
                }
                PathSegment::Index(index) => {
                    path.push('[');
                    path.push_str(&index.to_string());
                    path.push(']');
                }
            }
        }
        path
    }

    /// The path as a dotted field name, e.g. `address.city` or `tags.0`.
    pub fn to_dotted(&self) -> String {
        self.0
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) => key.clone(),
                PathSegment::Index(index) => index.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The Postgres text array form, e.g. `{"address","city"}`.
    pub fn to_text_array(&self) -> String {
        let elements: Vec<String> = self
            .0
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(key) => {
                    format!("\"{}\"", key.replace('\\', "\\\\").replace('"', "\\\""))
                }
                PathSegment::Index(index) => format!("\"{index}\""),
            })
            .collect();
        format!("{{{}}}", elements.join(","))
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a dotted field name, rejecting names we cannot address.
pub fn split_field_name(name: &str) -> Result<Vec<&str>, String> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(format!("invalid field name '{name}'"));
    }
    if name.contains('"') {
        return Err(format!("field name '{name}' contains a double quote"));
    }
    if segments.iter().any(|segment| segment.starts_with('$')) {
        return Err(format!("field name '{name}' contains an operator"));
    }
    Ok(segments)
}

/// A JSON array and where to find its elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySource {
    pub document: sql::ast::Expression,
    /// Where the array sits inside `document`. Empty when `document` is the array.
    pub path: JsonPath,
    /// The dotted name of the array, under which element fields are declared.
    pub prefix: String,
}

impl ArraySource {
    /// The array itself, as a JSON expression.
    pub fn expression(&self, env: &Env) -> sql::ast::Expression {
        if self.path.is_empty() {
            self.document.clone()
        } else {
            env.dialect
                .json_value(self.document.clone(), &self.path, env.paths)
        }
    }
}

/// What a field name refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTarget {
    /// A relational column.
    Column {
        column: sql::ast::Expression,
        definition: Option<FieldDefinition>,
    },
    /// A value inside a JSON document. An empty path is the document itself.
    Nested {
        document: sql::ast::Expression,
        path: JsonPath,
        definition: Option<FieldDefinition>,
    },
    /// An array. With a remainder, the path applied to each of its elements.
    Array {
        array: ArraySource,
        remainder: JsonPath,
    },
}

impl FieldTarget {
    pub fn definition(&self) -> Option<&FieldDefinition> {
        match self {
            FieldTarget::Column { definition, .. } | FieldTarget::Nested { definition, .. } => {
                definition.as_ref()
            }
            FieldTarget::Array { .. } => None,
        }
    }

    /// Whether the value is stored as JSON rather than as a typed column.
    pub fn holds_json(&self) -> bool {
        match self {
            FieldTarget::Column { definition, .. } => {
                definition.as_ref().is_some_and(|d| !d.is_scalar)
            }
            FieldTarget::Nested { .. } | FieldTarget::Array { .. } => true,
        }
    }

    /// A value comparable with values of the given kind.
    pub fn scalar(&self, env: &Env, kind: super::values::ValueKind) -> sql::ast::Expression {
        match self {
            FieldTarget::Column { column, .. } if self.holds_json() => {
                env.dialect.json_column_scalar(column.clone(), kind)
            }
            FieldTarget::Column { column, .. } => column.clone(),
            FieldTarget::Nested { document, path, .. } => {
                env.dialect
                    .json_scalar(document.clone(), path, kind, env.paths)
            }
            FieldTarget::Array { array, .. } => array.expression(env),
        }
    }

    /// The value as JSON, for whole-document comparisons and sorting.
    pub fn json(&self, env: &Env) -> sql::ast::Expression {
        match self {
            FieldTarget::Column { column, .. } => column.clone(),
            FieldTarget::Nested { document, path, .. } => {
                if path.is_empty() {
                    document.clone()
                } else {
                    env.dialect.json_value(document.clone(), path, env.paths)
                }
            }
            FieldTarget::Array { array, .. } => array.expression(env),
        }
    }

    /// View a column or nested value as an array, for array-only operators.
    pub fn as_array(&self, prefix: &str) -> Option<ArraySource> {
        match self {
            FieldTarget::Column { column, .. } => Some(ArraySource {
                document: column.clone(),
                path: JsonPath::default(),
                prefix: prefix.to_string(),
            }),
            FieldTarget::Nested { document, path, .. } => Some(ArraySource {
                document: document.clone(),
                path: path.clone(),
                prefix: prefix.to_string(),
            }),
            FieldTarget::Array { remainder, array } if remainder.is_empty() => Some(array.clone()),
            FieldTarget::Array { .. } => None,
        }
    }
}

/// Resolve a dotted field name in the current scope.
pub fn resolve_field(env: &Env, name: &str) -> Result<FieldTarget, String> {
    let segments = split_field_name(name)?;
    let (root, rest) = segments
        .split_first()
        .ok_or_else(|| format!("invalid field name '{name}'"))?;

    Ok(match &env.scope {
        Scope::Element { element, prefix } => {
            let dotted = format!("{prefix}.{root}");
            let definition = env.definition(&dotted);
            let is_array = definition.as_ref().is_some_and(|d| d.is_array);
            walk(
                env,
                element.clone(),
                JsonPath(vec![PathSegment::Key((*root).to_string())]),
                dotted,
                definition,
                is_array,
                rest,
            )
        }
        Scope::Collection => {
            let declared = env.schema.and_then(|schema| schema.column(root)).cloned();
            let overflow = env
                .schema
                .and_then(|schema| schema.overflow_column.as_deref());
            match (declared, overflow) {
                (Some(definition), _) => {
                    let is_array = definition.is_array;
                    walk(
                        env,
                        env.column(root),
                        JsonPath::default(),
                        (*root).to_string(),
                        Some(definition),
                        is_array,
                        rest,
                    )
                }
                // undeclared fields live in the overflow column
                (None, Some(overflow)) if *root != ID_FIELD => walk(
                    env,
                    env.column(overflow),
                    JsonPath(vec![PathSegment::Key((*root).to_string())]),
                    (*root).to_string(),
                    None,
                    env.is_hinted_array(root),
                    rest,
                ),
                (None, _) => walk(
                    env,
                    env.column(root),
                    JsonPath::default(),
                    (*root).to_string(),
                    None,
                    *root != ID_FIELD && env.is_hinted_array(root),
                    rest,
                ),
            }
        }
    })
}

fn walk(
    env: &Env,
    document: sql::ast::Expression,
    mut path: JsonPath,
    mut dotted: String,
    mut definition: Option<FieldDefinition>,
    mut is_array: bool,
    mut rest: &[&str],
) -> FieldTarget {
    while let Some((segment, tail)) = rest.split_first() {
        if is_array {
            if let Ok(index) = segment.parse::<usize>() {
                path.push(PathSegment::Index(index));
                definition = None;
                is_array = false;
                rest = tail;
                continue;
            }
            return FieldTarget::Array {
                array: ArraySource {
                    document,
                    path,
                    prefix: dotted,
                },
                remainder: JsonPath::from_segments(rest),
            };
        }
        path.push(PathSegment::Key((*segment).to_string()));
        dotted = format!("{dotted}.{segment}");
        definition = env.definition(&dotted);
        is_array = definition.as_ref().is_some_and(|d| d.is_array);
        rest = tail;
    }

    if is_array {
        FieldTarget::Array {
            array: ArraySource {
                document,
                path,
                prefix: dotted,
            },
            remainder: JsonPath::default(),
        }
    } else if path.is_empty() {
        FieldTarget::Column {
            column: document,
            definition,
        }
    } else {
        FieldTarget::Nested {
            document,
            path,
            definition,
        }
    }
}
