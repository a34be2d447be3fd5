//! End-to-end pipeline behaviour with in-memory sources

mod helpers;

use helpers::{collection, grouped, instance, StaticSource};
use rmv_motifs::reconcile::{CascadeMerger, HomologEnricher, RepresentativeIndex};
use rmv_motifs::types::meta;
use rmv_motifs::workflow::SourceSet;
use rmv_motifs::{Error, Pipeline, PipelineStatus, SourceId};
use std::sync::Arc;

const NR_LIST: &str = "\"NR_all_1.1\",\"4V9F|1|0\",\"4V9F|1|0,1ABC|1|0\"\n";

fn scenario_sources() -> SourceSet {
    let a = StaticSource::new("A").with_structure(
        "1ABC",
        collection(vec![("HL", instance("A1", "HL", "0", 10..=20))]),
    );
    let b = StaticSource::new("B").with_structure(
        "1ABC",
        collection(vec![("Kink-turn", instance("B1", "Kink-turn", "0", 10..=19))]),
    );
    let c = StaticSource::new("C").with_structure(
        "1ABC",
        collection(vec![("GNRA", instance("C1", "GNRA", "0", 50..=55))]),
    );
    SourceSet::new()
        .with(SourceId::RfamLocal, Arc::new(a))
        .with(SourceId::RfamApi, Arc::new(b))
        .with(SourceId::RnaMotifScan, Arc::new(c))
}

#[tokio::test]
async fn test_three_source_scenario_through_pipeline() {
    let pipeline = Pipeline::new(scenario_sources(), CascadeMerger::default());
    let outcome = pipeline
        .run(
            "1abc",
            &[SourceId::RfamLocal, SourceId::RfamApi, SourceId::RnaMotifScan],
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, PipelineStatus::Merged);
    assert_eq!(outcome.structure_id.as_str(), "1ABC");
    assert_eq!(outcome.motifs.total_instances(), 2);
    assert_eq!(outcome.motifs.get("HL").unwrap()[0].instance_id, "A1");
    assert_eq!(outcome.motifs.get("GNRA").unwrap()[0].instance_id, "C1");

    let counts: Vec<(u8, usize)> = outcome
        .per_source_counts
        .iter()
        .map(|c| (c.id, c.instances))
        .collect();
    assert_eq!(counts, vec![(2, 1), (4, 1), (6, 1)]);
}

#[tokio::test]
async fn test_selection_order_is_priority() {
    let pipeline = Pipeline::new(scenario_sources(), CascadeMerger::default());
    let outcome = pipeline
        .run("1ABC", &[SourceId::RfamApi, SourceId::RfamLocal])
        .await
        .unwrap();

    assert_eq!(outcome.motifs.total_instances(), 1);
    assert_eq!(outcome.motifs.get("KINK-TURN").unwrap()[0].instance_id, "B1");
}

#[tokio::test]
async fn test_all_sources_empty_is_not_an_error() {
    let sources = SourceSet::new()
        .with(SourceId::Atlas, Arc::new(StaticSource::new("empty")))
        .with(SourceId::BgsuApi, Arc::new(StaticSource::new("down").failing()));
    let pipeline = Pipeline::new(sources, CascadeMerger::default());

    let outcome = pipeline
        .run("9ZZZ", &[SourceId::Atlas, SourceId::BgsuApi])
        .await
        .unwrap();
    assert_eq!(outcome.status, PipelineStatus::AllSourcesEmpty);
    assert!(outcome.motifs.is_empty());
    assert!(!outcome.per_source_counts[0].failed);
    assert!(outcome.per_source_counts[1].failed);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "all_sources_empty");
    assert_eq!(json["structure_id"], "9ZZZ");
}

#[tokio::test]
async fn test_failing_source_degrades_to_empty() {
    let good = StaticSource::new("good").with_structure(
        "1ABC",
        collection(vec![("GNRA", instance("g", "GNRA", "A", 1..=4))]),
    );
    let sources = SourceSet::new()
        .with(SourceId::RfamApi, Arc::new(StaticSource::new("bad").failing()))
        .with(SourceId::RfamLocal, Arc::new(good));
    let pipeline = Pipeline::new(sources, CascadeMerger::default());

    let outcome = pipeline
        .run("1abc", &[SourceId::RfamApi, SourceId::RfamLocal])
        .await
        .unwrap();
    assert_eq!(outcome.status, PipelineStatus::Merged);
    assert_eq!(outcome.motifs.total_instances(), 1);
    assert!(outcome.per_source_counts[0].failed);
    assert_eq!(outcome.per_source_counts[1].instances, 1);
}

#[tokio::test]
async fn test_enrichment_runs_before_merge() {
    let atlas = StaticSource::new("atlas").with_structure(
        "1ABC",
        collection(vec![("HL", grouped("HL_1ABC_001", "HL", "0", 10..=20, "HL_100.1"))]),
    );
    let rfam = StaticSource::new("rfam").with_structure(
        "1ABC",
        collection(vec![("Kink-turn", instance("RF_1", "Kink-turn", "0", 60..=70))]),
    );
    let annotator = Arc::new(StaticSource::new("bgsu").with_structure(
        "4V9F",
        collection(vec![(
            "Kink-turn",
            grouped("HL_4V9F_001", "Kink-turn", "0", 1..=11, "HL_100.1"),
        )]),
    ));

    let index = Arc::new(RepresentativeIndex::from_reader(NR_LIST.as_bytes()));
    let enricher = HomologEnricher::new(index, annotator.clone());
    let sources = SourceSet::new()
        .with(SourceId::Atlas, Arc::new(atlas))
        .with(SourceId::RfamLocal, Arc::new(rfam));
    let pipeline = Pipeline::new(sources, CascadeMerger::default()).with_enricher(enricher);

    let outcome = pipeline
        .run("1ABC", &[SourceId::Atlas, SourceId::RfamLocal])
        .await
        .unwrap();

    assert!(outcome.motifs.get("HL").is_none());
    let kink_turns = outcome.motifs.get("KINK-TURN").unwrap();
    assert_eq!(kink_turns.len(), 2);
    let enriched = &kink_turns[0];
    assert_eq!(enriched.instance_id, "HL_1ABC_001");
    assert_eq!(enriched.motif_id, "Kink-turn");
    assert_eq!(
        enriched.metadata.get(meta::ENRICHED_FROM).and_then(|v| v.as_str()),
        Some("HL")
    );
    assert_eq!(annotator.call_count(), 1);
}

#[tokio::test]
async fn test_specific_sources_are_not_enriched() {
    let rfam = StaticSource::new("rfam").with_structure(
        "1ABC",
        collection(vec![("HL", grouped("R1", "HL", "0", 1..=5, "HL_100.1"))]),
    );
    let annotator = Arc::new(StaticSource::new("bgsu"));
    let index = Arc::new(RepresentativeIndex::from_reader(NR_LIST.as_bytes()));
    let pipeline = Pipeline::new(
        SourceSet::new().with(SourceId::RfamLocal, Arc::new(rfam)),
        CascadeMerger::default(),
    )
    .with_enricher(HomologEnricher::new(index, annotator.clone()));

    let outcome = pipeline.run("1ABC", &[SourceId::RfamLocal]).await.unwrap();
    assert_eq!(outcome.motifs.get("HL").unwrap()[0].instance_id, "R1");
    assert_eq!(annotator.call_count(), 0);
}

#[tokio::test]
async fn test_selection_errors() {
    let pipeline = Pipeline::new(scenario_sources(), CascadeMerger::default());

    assert!(matches!(pipeline.run("1ABC", &[]).await, Err(Error::Config(_))));
    assert!(matches!(
        pipeline
            .run("1ABC", &[SourceId::RfamApi, SourceId::RfamApi])
            .await,
        Err(Error::Config(_))
    ));
    assert!(matches!(
        pipeline.run("1AB", &[SourceId::RfamApi]).await,
        Err(Error::InvalidInput(_))
    ));
}
