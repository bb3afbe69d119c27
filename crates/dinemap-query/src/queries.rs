//! SPARQL query texts issued by the dashboard
//!
//! Variable names shared with the row parsers live in [`vars`].

use crate::error::{QueryError, QueryResult};
use dinemap_core::{CategoryField, DashboardConfig, LazyAttribute, RatingBucket, RecordId};

/// Default vocabulary namespace
pub const DEFAULT_NAMESPACE: &str = "http://ltr.european-restaurants.org/";

/// Separator used by `GROUP_CONCAT` in the tag batch query
pub const TAG_SEPARATOR: &str = "||";

/// Projected variable names
pub mod vars {
    pub const RECORD: &str = "r";
    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
    pub const AVG_RATING: &str = "avgRating";
    pub const OPEN_HOURS: &str = "openHours";
    pub const KEYWORDS: &str = "keywords";
    pub const GLUTEN_FREE: &str = "isGlutenFree";
    pub const VEGAN_OPTIONS: &str = "isVeganOptions";
    pub const VEGETARIAN_FRIENDLY: &str = "isVegetarianFriendly";
    pub const COUNTRY: &str = "country";
    pub const CITY: &str = "city";
    pub const PRICE_LEVEL: &str = "priceLevel";
    pub const AVERAGE_COUNT: &str = "averageCount";
    pub const EXCELLENT_COUNT: &str = "excellentCount";
    pub const VERY_GOOD_COUNT: &str = "veryGoodCount";
    pub const POOR_COUNT: &str = "poorCount";
    pub const TERRIBLE_COUNT: &str = "terribleCount";
    pub const ATMOSPHERE: &str = "atmosphere";
    pub const SERVICE: &str = "service";
    pub const FOOD: &str = "food";
    pub const VALUE: &str = "value";
    pub const SAME_AS: &str = "sameAs";

    pub const DISTINCT_VALUE: &str = "s";
    pub const COUNT: &str = "n";
    pub const CUISINE: &str = "cuisine";
    pub const MEAL: &str = "meal";
    pub const BUCKET: &str = "bucket";
}

/// Aggregate variable carrying the joined values of a lazy attribute
#[must_use]
pub fn tag_var(attribute: LazyAttribute) -> &'static str {
    attribute.property()
}

/// Wrap an identifier as an IRI reference, rejecting characters IRIREF forbids
pub fn iri_ref(id: &str) -> QueryResult<String> {
    let forbidden = |c: char| c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\');
    if id.is_empty() || id.chars().any(forbidden) {
        return Err(QueryError::InvalidIri(id.to_string()));
    }
    Ok(format!("<{id}>"))
}

/// Query text factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQueries {
    namespace: String,
    named_graph: Option<String>,
}

impl SparqlQueries {
    /// Queries against the default namespace and default graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            named_graph: None,
        }
    }

    /// Queries for a dashboard configuration
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            named_graph: config.named_graph.clone(),
            ..Self::new()
        }
    }

    /// With vocabulary namespace
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// With named graph restriction
    #[must_use]
    pub fn with_named_graph(mut self, graph: impl Into<String>) -> Self {
        self.named_graph = Some(graph.into());
        self
    }

    fn prologue(&self) -> String {
        format!(
            "PREFIX : <{}>\nPREFIX owl: <http://www.w3.org/2002/07/owl#>\n",
            self.namespace
        )
    }

    fn dataset(&self) -> String {
        self.named_graph
            .as_ref()
            .map(|g| format!("FROM <{g}>\n"))
            .unwrap_or_default()
    }

    /// Full record set with every scalar attribute
    #[must_use]
    pub fn records(&self, limit: usize) -> String {
        format!(
            r"{prologue}
SELECT ?r ?name ?address ?lat ?lon ?avgRating ?openHours ?keywords
       ?isGlutenFree ?isVeganOptions ?isVegetarianFriendly
       ?country ?city ?priceLevel
       ?averageCount ?excellentCount ?veryGoodCount ?poorCount ?terribleCount
       ?atmosphere ?service ?food ?value
       ?sameAs
{dataset}WHERE {{
  ?r a :Restaurant ;
       :restaurantName ?name ;
       :coordinate [ :latitude ?lat ; :longitude ?lon ] ;
       :address ?address ;
       :avgRating ?avgRating ;
       :isGlutenFree ?isGlutenFree ;
       :isVeganOptions ?isVeganOptions ;
       :isVegetarianFriendly ?isVegetarianFriendly ;
       :country ?country ;
       :city ?city ;
       :priceLevel ?priceLevel ;
       :reviewsComponents [
          :averageCount ?averageCount ;
          :excellentCount ?excellentCount ;
          :veryGoodCount ?veryGoodCount ;
          :poorCount ?poorCount ;
          :terribleCount ?terribleCount
       ] ;
       :scoreComponents [
          :atmosphereScore ?atmosphere ;
          :serviceScore ?service ;
          :foodScore ?food ;
          :valueScore ?value
       ] .
  OPTIONAL {{ ?r :originalOpenHours ?openHours . }}
  OPTIONAL {{ ?r :keywords ?keywords . }}
  OPTIONAL {{ ?r owl:sameAs ?sameAs . }}
}}
LIMIT {limit}
",
            prologue = self.prologue(),
            dataset = self.dataset(),
        )
    }

    /// Lazy attributes for a batch of records, one row per record that has any
    pub fn tag_batch(&self, ids: &[RecordId]) -> QueryResult<String> {
        let values = ids
            .iter()
            .map(|id| iri_ref(id.as_str()).map(|iri| format!("({iri}) ")))
            .collect::<QueryResult<String>>()?;

        let mut projection = String::new();
        let mut optionals = String::new();
        for attr in LazyAttribute::ALL {
            let var = tag_var(attr);
            let single = single_var(attr);
            projection.push_str(&format!(
                "\n       (GROUP_CONCAT(DISTINCT ?{single}; separator=\"{TAG_SEPARATOR}\") AS ?{var})"
            ));
            optionals.push_str(&format!(
                "\n  OPTIONAL {{ ?r :{} ?{single} . }}",
                attr.property()
            ));
        }

        Ok(format!(
            "{prologue}\nSELECT ?r{projection}\n{dataset}WHERE {{\n  VALUES (?r) {{ {values}}}\n{optionals}\n}}\nGROUP BY ?r\n",
            prologue = self.prologue(),
            dataset = self.dataset(),
            optionals = optionals.trim_start_matches('\n'),
        ))
    }

    /// Distinct values of the data property behind a selector
    #[must_use]
    pub fn distinct_values(&self, field: CategoryField) -> String {
        format!(
            "{prologue}\nSELECT DISTINCT ?s\n{dataset}WHERE {{\n  ?r a :Restaurant ;\n       :{property} ?s .\n}}\nORDER BY ?s\n",
            prologue = self.prologue(),
            dataset = self.dataset(),
            property = field.property(),
        )
    }

    /// Most frequent cuisines with restaurant counts
    #[must_use]
    pub fn top_cuisines(&self, limit: usize) -> String {
        format!(
            "{prologue}\nSELECT ?cuisine (COUNT(?r) AS ?n)\n{dataset}WHERE {{\n  ?r a :Restaurant ;\n       :cuisines ?cuisine .\n}}\nGROUP BY ?cuisine\nORDER BY DESC(?n)\nLIMIT {limit}\n",
            prologue = self.prologue(),
            dataset = self.dataset(),
        )
    }

    /// Restaurant counts per rating bucket
    #[must_use]
    pub fn rating_distribution(&self) -> String {
        let [low, fair, good, excellent] = RatingBucket::ALL.map(RatingBucket::label);
        format!(
            "{prologue}\nSELECT ?bucket (COUNT(?r) AS ?n)\n{dataset}WHERE {{\n  ?r a :Restaurant ;\n       :avgRating ?a .\n  BIND(\n    IF(?a < 2.5, \"{low}\",\n    IF(?a < 3.5, \"{fair}\",\n    IF(?a < 4.5, \"{good}\", \"{excellent}\"))) AS ?bucket\n  )\n}}\nGROUP BY ?bucket\nORDER BY ?bucket\n",
            prologue = self.prologue(),
            dataset = self.dataset(),
        )
    }

    /// Most frequent meals with distinct restaurant counts
    #[must_use]
    pub fn top_meals(&self, limit: usize) -> String {
        format!(
            "{prologue}\nSELECT ?meal (COUNT(DISTINCT ?r) AS ?n)\n{dataset}WHERE {{\n  ?r a :Restaurant ;\n     :meals ?meal .\n}}\nGROUP BY ?meal\nORDER BY DESC(?n)\nLIMIT {limit}\n",
            prologue = self.prologue(),
            dataset = self.dataset(),
        )
    }
}

impl Default for SparqlQueries {
    fn default() -> Self {
        Self::new()
    }
}

fn single_var(attribute: LazyAttribute) -> &'static str {
    match attribute {
        LazyAttribute::Cuisine => "cuisine",
        LazyAttribute::Meal => "meal",
        LazyAttribute::Feature => "feature",
        LazyAttribute::Award => "award",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_ref_wraps_valid_identifiers() {
        assert_eq!(
            iri_ref("http://ltr.european-restaurants.org/restaurant_g187147-d1").unwrap(),
            "<http://ltr.european-restaurants.org/restaurant_g187147-d1>"
        );
    }

    #[test]
    fn iri_ref_rejects_forbidden_characters() {
        for bad in ["", "http://x/a b", "http://x/a>b", "http://x/{a}", "http://x/\"q\""] {
            assert!(matches!(iri_ref(bad), Err(QueryError::InvalidIri(_))), "{bad}");
        }
    }

    #[test]
    fn tag_batch_embeds_every_identifier_once() {
        let ids = vec![RecordId::new("http://x/r1"), RecordId::new("http://x/r2")];
        let q = SparqlQueries::new().tag_batch(&ids).unwrap();

        assert!(q.contains("VALUES (?r) { (<http://x/r1>) (<http://x/r2>) }"));
        assert_eq!(q.matches("<http://x/r1>").count(), 1);
        assert!(q.contains("GROUP_CONCAT(DISTINCT ?cuisine; separator=\"||\") AS ?cuisines"));
        assert!(q.contains("OPTIONAL { ?r :awards ?award . }"));
        assert!(q.trim_end().ends_with("GROUP BY ?r"));
    }

    #[test]
    fn tag_batch_fails_on_bad_identifier() {
        let ids = vec![RecordId::new("http://x/r1"), RecordId::new("not an iri")];
        assert!(SparqlQueries::new().tag_batch(&ids).is_err());
    }

    #[test]
    fn records_query_carries_limit_and_optionals() {
        let q = SparqlQueries::new().records(5000);
        assert!(q.contains("LIMIT 5000"));
        assert!(q.contains("OPTIONAL { ?r owl:sameAs ?sameAs . }"));
        assert!(q.starts_with("PREFIX : <http://ltr.european-restaurants.org/>"));
        assert!(!q.contains("FROM <"));
    }

    #[test]
    fn named_graph_adds_dataset_clause() {
        let q = SparqlQueries::new()
            .with_named_graph("http://ltr.european-restaurants.org")
            .top_meals(10);
        assert!(q.contains("FROM <http://ltr.european-restaurants.org>\nWHERE"));
        assert!(q.contains("LIMIT 10"));
    }

    #[test]
    fn distinct_values_uses_selector_property() {
        let q = SparqlQueries::new().distinct_values(CategoryField::Price);
        assert!(q.contains(":priceLevel ?s"));
        assert!(q.contains("ORDER BY ?s"));
    }

    #[test]
    fn rating_distribution_uses_bucket_labels() {
        let q = SparqlQueries::new().rating_distribution();
        for bucket in RatingBucket::ALL {
            assert!(q.contains(&format!("\"{}\"", bucket.label())));
        }
    }
}
