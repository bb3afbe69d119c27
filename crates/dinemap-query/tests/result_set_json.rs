use dinemap_query::{decode_results, vars, TermKind};
use pretty_assertions::assert_eq;

const RECORD_RESPONSE: &str = r#"{
  "head": { "vars": ["r", "name", "lat", "lon", "sameAs"] },
  "results": {
    "bindings": [
      {
        "r": { "type": "uri", "value": "http://ltr.european-restaurants.org/restaurant_1" },
        "name": { "type": "literal", "value": "Le Petit Zinc", "xml:lang": "fr" },
        "lat": { "type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#decimal", "value": "48.853" },
        "lon": { "type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#decimal", "value": "2.333" }
      },
      {
        "r": { "type": "uri", "value": "http://ltr.european-restaurants.org/restaurant_2" },
        "sameAs": { "type": "uri", "value": "http://www.wikidata.org/entity/Q38076" }
      }
    ]
  }
}"#;

#[test]
fn decodes_bindings_with_optional_variables() {
    let results = decode_results(RECORD_RESPONSE.as_bytes()).unwrap();

    assert_eq!(results.head.vars.len(), 5);
    assert_eq!(results.len(), 2);

    let first = &results.rows()[0];
    assert_eq!(first.value(vars::NAME), Some("Le Petit Zinc"));
    assert_eq!(first.get(vars::NAME).unwrap().lang.as_deref(), Some("fr"));
    assert_eq!(first.get(vars::LON).unwrap().kind, TermKind::TypedLiteral);
    assert_eq!(first.value(vars::SAME_AS), None);

    let second = &results.rows()[1];
    assert_eq!(second.get(vars::SAME_AS).unwrap().kind, TermKind::Uri);
    assert_eq!(second.value(vars::NAME), None);
}

#[test]
fn decodes_empty_result() {
    let results = decode_results(br#"{"head":{"vars":["s"]},"results":{"bindings":[]}}"#).unwrap();
    assert!(results.is_empty());
}

#[test]
fn rejects_unknown_term_kind() {
    let body = br#"{"head":{"vars":["s"]},"results":{"bindings":[{"s":{"type":"triple","value":"x"}}]}}"#;
    assert!(decode_results(body).is_err());
}
