//! Homolog enrichment against an in-memory annotator

mod helpers;

use helpers::{collection, grouped, instance, StaticSource};
use rmv_motifs::reconcile::{HomologEnricher, RepresentativeIndex};
use rmv_motifs::types::meta;
use rmv_motifs::{MotifCollection, StructureId};
use std::sync::Arc;

/// 1ABC chain 0 is represented by 4V9F chain 0
const MEMBER_OF_4V9F: &str = "\"C\",\"4V9F|1|0\",\"4V9F|1|0,1ABC|1|0\"\n";
/// 1ABC chain 0 is its own representative
const SELF_REPRESENTED: &str = "\"C\",\"1ABC|1|0\",\"1ABC|1|0\"\n";

fn index(csv: &str) -> Arc<RepresentativeIndex> {
    Arc::new(RepresentativeIndex::from_reader(csv.as_bytes()))
}

fn query() -> StructureId {
    StructureId::parse("1ABC").unwrap()
}

fn kink_turn_rep() -> MotifCollection {
    collection(vec![(
        "Kink-turn",
        grouped("HL_4V9F_001", "Kink-turn", "0", 1..=6, "HL_100.1"),
    )])
}

#[tokio::test]
async fn test_motif_group_match_renames() {
    let annotator = Arc::new(StaticSource::new("bgsu").with_structure("4V9F", kink_turn_rep()));
    let enricher = HomologEnricher::new(index(MEMBER_OF_4V9F), annotator);

    let original = grouped("HL_1ABC_007", "HL", "0", 70..=80, "HL_100.1");
    let input = collection(vec![("HL", original.clone())]);

    let out = enricher.enrich(&query(), &input).await;
    let renamed = &out.get("Kink-turn").unwrap()[0];
    assert_eq!(renamed.motif_id, "Kink-turn");
    assert_eq!(renamed.annotation, "Kink-turn");
    assert_eq!(renamed.residues, original.residues);
    assert_eq!(
        renamed.metadata.get(meta::ENRICHED_FROM).and_then(|v| v.as_str()),
        Some("HL")
    );
    assert!(out.get("HL").is_none());
    assert_eq!(input.get("HL").unwrap()[0], original);
}

#[tokio::test]
async fn test_not_in_index_returns_input() {
    let annotator = Arc::new(StaticSource::new("bgsu"));
    let enricher = HomologEnricher::new(index(""), annotator.clone());
    let input = collection(vec![("HL", instance("a", "HL", "0", 1..=4))]);

    assert_eq!(enricher.enrich(&query(), &input).await, input);
    assert_eq!(annotator.call_count(), 0);
}

#[tokio::test]
async fn test_generic_only_representative_is_noop() {
    let rep = collection(vec![("HL", grouped("r", "HL", "0", 1..=4, "HL_1.1"))]);
    let annotator = Arc::new(StaticSource::new("bgsu").with_structure("4V9F", rep));
    let enricher = HomologEnricher::new(index(MEMBER_OF_4V9F), annotator);

    let input = collection(vec![("HL", grouped("a", "HL", "0", 1..=4, "HL_1.1"))]);
    assert_eq!(enricher.enrich(&query(), &input).await, input);
}

#[tokio::test]
async fn test_annotator_failure_keeps_generic_names() {
    let annotator = Arc::new(StaticSource::new("bgsu").failing());
    let enricher = HomologEnricher::new(index(MEMBER_OF_4V9F), annotator);
    let input = collection(vec![("IL", grouped("a", "IL", "0", 1..=4, "HL_100.1"))]);
    assert_eq!(enricher.enrich(&query(), &input).await, input);
}

#[tokio::test]
async fn test_failed_fetch_is_retried() {
    let annotator = Arc::new(
        StaticSource::new("bgsu")
            .with_structure("4V9F", kink_turn_rep())
            .failing_first(1),
    );
    let enricher = HomologEnricher::new(index(MEMBER_OF_4V9F), annotator.clone());
    let input = collection(vec![("HL", grouped("a", "HL", "0", 70..=80, "HL_100.1"))]);

    let first = enricher.enrich(&query(), &input).await;
    assert_eq!(first, input);

    let second = enricher.enrich(&query(), &input).await;
    assert_eq!(second.get("Kink-turn").unwrap()[0].instance_id, "a");
    assert_eq!(annotator.call_count(), 2);
}

#[tokio::test]
async fn test_residue_fallback_on_self_representative_chain() {
    let rep = collection(vec![("GNRA", grouped("g", "GNRA", "0", 10..=17, "HL_9.9"))]);
    let annotator = Arc::new(StaticSource::new("bgsu").with_structure("1ABC", rep));
    let enricher = HomologEnricher::new(index(SELF_REPRESENTED), annotator);

    let input = collection(vec![("HL", instance("a", "HL", "0", 10..=18))]);
    let out = enricher.enrich(&query(), &input).await;
    assert_eq!(out.get("GNRA").unwrap()[0].instance_id, "a");
}

#[tokio::test]
async fn test_no_residue_fallback_for_non_self_representative() {
    let rep = collection(vec![("GNRA", grouped("g", "GNRA", "0", 10..=17, "HL_9.9"))]);
    let annotator = Arc::new(StaticSource::new("bgsu").with_structure("4V9F", rep));
    let enricher = HomologEnricher::new(index(MEMBER_OF_4V9F), annotator);

    let input = collection(vec![("HL", instance("a", "HL", "0", 10..=17))]);
    let out = enricher.enrich(&query(), &input).await;
    assert!(out.get("GNRA").is_none());
    assert_eq!(out.get("HL").unwrap().len(), 1);
}

#[tokio::test]
async fn test_representative_fetched_once() {
    let rep = collection(vec![("GNRA", grouped("g", "GNRA", "0", 1..=4, "HL_2.2"))]);
    let annotator = Arc::new(StaticSource::new("bgsu").with_structure("4V9F", rep));
    let enricher = HomologEnricher::new(
        index("\"C\",\"4V9F|1|0+4V9F|1|1\",\"1ABC|1|0+1ABC|1|1\"\n"),
        annotator.clone(),
    );
    let input = MotifCollection::new();
    enricher.enrich(&query(), &input).await;
    enricher.enrich(&query(), &input).await;
    assert_eq!(annotator.call_count(), 1);
}

#[test]
fn test_threshold_validation() {
    let enricher = HomologEnricher::new(index(""), Arc::new(StaticSource::new("bgsu")));
    assert!(enricher.with_threshold(0.0).is_err());
}
