/**
 * shacl.rs
 * SHACL node shape export of a schema (Turtle)
 */

use std::fmt::Write;

use crate::schema::{PropertyDirection, PropertyRange, Schema};
use crate::vocab;

/// Renders a `sh:NodeShape` targeting the schema class.
///
/// Reverse properties have no forward path and are left out.
pub fn render(schema: &Schema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "@prefix sh: <{}> .", vocab::SH);
    let _ = writeln!(out, "@prefix xsd: <{}> .", vocab::XSD);
    let _ = writeln!(out);
    let _ = write!(
        out,
        "{} a sh:NodeShape ;\n    sh:targetClass {}",
        schema.rdf_type(),
        schema.rdf_type()
    );

    for property in schema
        .properties()
        .iter()
        .filter(|p| p.direction == PropertyDirection::Forward)
    {
        let _ = write!(out, " ;\n    sh:property [\n        sh:path {} ;\n", property.predicate);
        match &property.range {
            PropertyRange::Datatype(datatype) if datatype.as_str() == vocab::XSD_ANY_URI => {
                let _ = writeln!(out, "        sh:nodeKind sh:IRI ;");
            }
            PropertyRange::Datatype(datatype) => {
                let _ = writeln!(out, "        sh:datatype {} ;", datatype);
            }
            PropertyRange::Class { rdf_type, .. } => {
                let _ = writeln!(out, "        sh:class {} ;", rdf_type);
            }
        }
        let min = if property.optional { 0 } else { 1 };
        let _ = write!(out, "        sh:minCount {}", min);
        if !property.list {
            let _ = write!(out, " ;\n        sh:maxCount 1");
        }
        let _ = write!(out, "\n    ]");
    }
    let _ = writeln!(out, " .");
    out
}
