/**
 * pattern.rs
 * Graph pattern pieces rendered into SPARQL text
 */

use std::fmt;

use oxigraph::model::{NamedNode, Term, Triple};

/// Subject or object position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternTerm {
    Variable(String),
    Term(Term),
}

impl PatternTerm {
    pub fn var(name: impl Into<String>) -> Self {
        PatternTerm::Variable(name.into())
    }

    pub fn node(node: &NamedNode) -> Self {
        PatternTerm::Term(Term::NamedNode(node.clone()))
    }
}

impl fmt::Display for PatternTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternTerm::Variable(name) => write!(f, "?{}", name),
            PatternTerm::Term(term) => write!(f, "{}", term),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: NamedNode,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn new(subject: PatternTerm, predicate: NamedNode, object: PatternTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl From<&Triple> for TriplePattern {
    fn from(triple: &Triple) -> Self {
        let subject = match &triple.subject {
            oxigraph::model::Subject::NamedNode(node) => PatternTerm::node(node),
            other => PatternTerm::Term(Term::from(other.clone())),
        };
        TriplePattern::new(subject, triple.predicate.clone(), PatternTerm::Term(triple.object.clone()))
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupElement {
    Triple(TriplePattern),
    Optional(Vec<TriplePattern>),
    Filter(String),
    /// Pattern text the typed elements cannot express (property paths, BIND)
    Raw(String),
}

impl GroupElement {
    fn write(&self, out: &mut String, indent: &str) {
        match self {
            GroupElement::Triple(pattern) => {
                out.push_str(&format!("{}{}\n", indent, pattern));
            }
            GroupElement::Optional(patterns) => {
                out.push_str(&format!("{}OPTIONAL {{ ", indent));
                for pattern in patterns {
                    out.push_str(&format!("{} ", pattern));
                }
                out.push_str("}\n");
            }
            GroupElement::Filter(expression) => {
                out.push_str(&format!("{}FILTER({})\n", indent, expression));
            }
            GroupElement::Raw(text) => {
                out.push_str(&format!("{}{}\n", indent, text));
            }
        }
    }
}

/// WHERE clause split between data patterns (scoped to the graph, if any)
/// and patterns always evaluated against the default graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    graph: Option<NamedNode>,
    values: Option<(String, Vec<Term>)>,
    scoped: Vec<GroupElement>,
    unscoped: Vec<GroupElement>,
}

impl WhereClause {
    pub fn new(graph: Option<&NamedNode>) -> Self {
        Self {
            graph: graph.cloned(),
            ..Default::default()
        }
    }

    pub fn values(&mut self, variable: &str, values: Vec<Term>) -> &mut Self {
        self.values = Some((variable.to_string(), values));
        self
    }

    pub fn push(&mut self, element: GroupElement) -> &mut Self {
        self.scoped.push(element);
        self
    }

    pub fn triple(&mut self, pattern: TriplePattern) -> &mut Self {
        self.push(GroupElement::Triple(pattern))
    }

    pub fn optional(&mut self, pattern: TriplePattern) -> &mut Self {
        self.push(GroupElement::Optional(vec![pattern]))
    }

    pub fn push_unscoped(&mut self, element: GroupElement) -> &mut Self {
        self.unscoped.push(element);
        self
    }

    pub fn filter(&mut self, expression: impl Into<String>) -> &mut Self {
        self.push_unscoped(GroupElement::Filter(expression.into()))
    }

    pub fn render(&self) -> String {
        let mut out = String::from("{\n");
        if let Some((variable, values)) = &self.values {
            let terms: Vec<String> = values.iter().map(Term::to_string).collect();
            out.push_str(&format!("  VALUES ?{} {{ {} }}\n", variable, terms.join(" ")));
        }
        match &self.graph {
            Some(graph) => {
                out.push_str(&format!("  GRAPH {} {{\n", graph));
                for element in &self.scoped {
                    element.write(&mut out, "    ");
                }
                out.push_str("  }\n");
            }
            None => {
                for element in &self.scoped {
                    element.write(&mut out, "  ");
                }
            }
        }
        for element in &self.unscoped {
            element.write(&mut out, "  ");
        }
        out.push('}');
        out
    }
}

/// Renders ground triples as a data block, graph-scoped when requested.
pub fn data_block(triples: &[Triple], graph: Option<&NamedNode>) -> String {
    let mut out = String::from("{\n");
    let indent = if graph.is_some() { "    " } else { "  " };
    if let Some(graph) = graph {
        out.push_str(&format!("  GRAPH {} {{\n", graph));
    }
    for triple in triples {
        out.push_str(&format!("{}{} .\n", indent, triple));
    }
    if graph.is_some() {
        out.push_str("  }\n");
    }
    out.push('}');
    out
}
