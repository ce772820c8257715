//! Prompt templates for the three language-model stages.

use std::collections::BTreeSet;

use kratos_core::SchemaSnapshot;

/// Prompt asking the model to pick one of `categories` for `question`.
pub fn intent_prompt(question: &str, categories: &[String]) -> String {
    let options: String = categories
        .iter()
        .map(|c| format!("- {c}\n"))
        .collect();

    format!(
        "Classify the intent of:\n\
         {question}\n\
         \n\
         Options:\n\
         {options}\
         \n\
         Respond with the option name only.\n"
    )
}

/// Prompt asking the model for a read-only Cypher query over `schema`.
pub fn cypher_prompt(question: &str, intent: &str, schema: &SchemaSnapshot) -> String {
    let labels = join(schema.labels());
    let relationships = join(schema.relationship_types());
    let properties: Vec<String> = schema
        .properties_by_label()
        .iter()
        .map(|(label, props)| format!("{label}: [{}]", join(props)))
        .collect();

    format!(
        "You are a Neo4j Cypher expert.\n\
         Your goal is to convert a user's question into a valid, READ-ONLY Cypher query.\n\
         \n\
         [SCHEMA]\n\
         Node Labels: [{labels}]\n\
         Relationship Types: [{relationships}]\n\
         Properties by Label: {{{properties}}}\n\
         \n\
         [RULES]\n\
         1. Use ONLY the labels and relationships provided above.\n\
         2. If direction is unknown, use undirected: (a)-[:RELATIONSHIP]-(b)\n\
         3. For variable-length paths, use: -[*1..3]-\n\
         4. Always use aliases for nodes and relationships, e.g., MATCH (n:Label)-[r:REL]->(m:Other)\n\
         5. Return ONLY the raw Cypher query, no explanation or markdown.\n\
         \n\
         [EXAMPLES]\n\
         - Single Node: \"Find person Rahul\" -> MATCH (n:Person) WHERE n.name = 'Rahul' RETURN n\n\
         - Relationship: \"What projects does Rahul work on?\" -> \
         MATCH (p:Person {{name: 'Rahul'}})-[r:WORKS_ON]->(proj:Project) RETURN proj\n\
         \n\
         User Query: {question}\n\
         Intent: {intent}\n",
        properties = properties.join(", "),
    )
}

/// Prompt asking the model to answer `question` from `context` alone.
pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Question:\n\
         {question}\n\
         \n\
         Graph Data:\n\
         {context}\n\
         \n\
         Provide structured explanation. Use only the graph data above; \
         if it does not contain the answer, say so.\n"
    )
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}
