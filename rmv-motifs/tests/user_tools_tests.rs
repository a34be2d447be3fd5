//! User annotation directories scanned through `UserToolSource`

mod helpers;

use helpers::write_file;
use rmv_motifs::adapters::{PValueFilter, ToolFormat, UserToolSource};
use rmv_motifs::{MotifSource, StructureId};
use tempfile::TempDir;

fn structure() -> StructureId {
    StructureId::parse("1S72").unwrap()
}

#[tokio::test]
async fn test_rms_malformed_line_is_skipped() {
    let root = TempDir::new().unwrap();
    write_file(
        &root.path().join("RNAMotifScan/kturn/Res_1s72"),
        "1s72_01\tlocation: '0'77-'0'81/'0'93-'0'100\tScore: 60.8\tP-value: 0.01\tFPR: 0.0\n\
         1s72_02\tlocation: '0'1-'0'5\n",
    );

    let source = UserToolSource::new(ToolFormat::RnaMotifScan, root.path());
    let motifs = source.get_motifs_for_structure(&structure()).await.unwrap();

    assert_eq!(motifs.total_instances(), 1);
    let hit = &motifs.get("KINK-TURN").unwrap()[0];
    assert_eq!(hit.instance_id, "RMS_1s72_01_1");
    assert_eq!(hit.residues.len(), 13);
}

#[tokio::test]
async fn test_rms_pvalue_boundary_and_score_order() {
    let root = TempDir::new().unwrap();
    // C-LOOP default threshold is 0.04
    write_file(
        &root.path().join("RNAMotifScan/c_loop/Res_1s72"),
        "a\tlocation: '0'1-'0'3\tScore: 10.0\tP-value: 0.04\n\
         b\tlocation: '0'11-'0'13\tScore: 30.0\tP-value: 0.0401\n\
         c\tlocation: '0'21-'0'23\tScore: 30.0\tP-value: 0.001\n\
         d\tlocation: '0'31-'0'33\tScore: 20.0\tP-value: 0.02\n\
         e\tlocation: '0'41-'0'43\tScore: 30.0\tP-value: 0.03\n",
    );

    let source = UserToolSource::new(ToolFormat::RnaMotifScan, root.path());
    let motifs = source.get_motifs_for_structure(&structure()).await.unwrap();

    let ids: Vec<&str> = motifs
        .get("C-LOOP")
        .unwrap()
        .iter()
        .map(|i| i.instance_id.as_str())
        .collect();
    assert_eq!(ids, vec!["RMS_c_3", "RMS_e_5", "RMS_d_4", "RMS_a_1"]);
}

#[tokio::test]
async fn test_rms_nan_score_sorts_last() {
    let root = TempDir::new().unwrap();
    write_file(
        &root.path().join("RNAMotifScan/c_loop/Res_1s72"),
        "a\tlocation: '0'1-'0'3\tScore: 5.0\tP-value: 0.001\n\
         b\tlocation: '0'11-'0'13\tScore: NaN\tP-value: 0.001\n\
         c\tlocation: '0'21-'0'23\tScore: 9.0\tP-value: 0.001\n\
         d\tlocation: '0'31-'0'33\tScore: 7.0\tP-value: 0.001\n",
    );

    let source = UserToolSource::new(ToolFormat::RnaMotifScan, root.path());
    let motifs = source.get_motifs_for_structure(&structure()).await.unwrap();

    let ids: Vec<&str> = motifs
        .get("C-LOOP")
        .unwrap()
        .iter()
        .map(|i| i.instance_id.as_str())
        .collect();
    assert_eq!(ids, vec!["RMS_c_3", "RMS_d_4", "RMS_a_1", "RMS_b_2"]);
}

#[tokio::test]
async fn test_oversized_ranges_are_skipped() {
    let root = TempDir::new().unwrap();
    write_file(
        &root.path().join("RNAMotifScan/kturn/Res_1s72"),
        "big\tlocation: '0'1-'0'2147483647\tScore: 90.0\tP-value: 0.001\n\
         ok\tlocation: '0'40-'0'47\tScore: 10.0\tP-value: 0.001\n",
    );
    write_file(
        &root.path().join("RNAMotifScanX/k-turn_consensus/result_0_100.log"),
        "1S72_0:1-99999999\t\t90.0\t0.001\n\
         1S72_0:10-14\t\t50.0\t0.001\n",
    );

    let rms = UserToolSource::new(ToolFormat::RnaMotifScan, root.path());
    let hits = rms.get_motifs_for_structure(&structure()).await.unwrap();
    assert_eq!(hits.total_instances(), 1);
    assert_eq!(hits.get("KINK-TURN").unwrap()[0].instance_id, "RMS_ok_2");

    let rmsx = UserToolSource::new(ToolFormat::RnaMotifScanX, root.path());
    let hits = rmsx.get_motifs_for_structure(&structure()).await.unwrap();
    assert_eq!(hits.total_instances(), 1);
    assert_eq!(hits.get("K-TURN").unwrap()[0].instance_id, "RMSX_1S72_0_10_14");
}

#[tokio::test]
async fn test_rms_filter_override_and_disable() {
    let root = TempDir::new().unwrap();
    write_file(
        &root.path().join("RNAMotifScan/c_loop/Res_1s72"),
        "a\tlocation: '0'1-'0'3\tScore: 10.0\tP-value: 0.5\n",
    );

    let relaxed = PValueFilter::new(ToolFormat::RnaMotifScan, true, vec![("C-LOOP".to_string(), 0.5)]).unwrap();
    let source = UserToolSource::new(ToolFormat::RnaMotifScan, root.path()).with_filter(relaxed);
    assert_eq!(source.get_motifs_for_structure(&structure()).await.unwrap().total_instances(), 1);

    let strict = UserToolSource::new(ToolFormat::RnaMotifScan, root.path());
    assert!(strict.get_motifs_for_structure(&structure()).await.unwrap().is_empty());

    let disabled = PValueFilter::new(ToolFormat::RnaMotifScan, false, Vec::new()).unwrap();
    let source = UserToolSource::new(ToolFormat::RnaMotifScan, root.path()).with_filter(disabled);
    assert_eq!(source.get_motifs_for_structure(&structure()).await.unwrap().total_instances(), 1);
}

#[tokio::test]
async fn test_rmsx_priority_file_per_family() {
    let root = TempDir::new().unwrap();
    let family = root.path().join("RNAMotifScanX/k-turn_consensus");
    write_file(
        &family.join("result_0_100_withbs.log"),
        "#fragment_ID\taligned_regions\talignment_score\tP-value\n\
         2ABC_0:1-5\t\t99.0\t0.001\n",
    );
    write_file(
        &family.join("result_0_100.log"),
        "#fragment_ID\taligned_regions\talignment_score\tP-value\n\
         1S72_0:75-85_89-98\t0:'0'77-4:'0'81,13:'0'93-20:'0'100\t144.8\t0.0073\n\
         1S72_0:10-14\t\t50.0\t0.066\n\
         1S72_0:20-24\t\t70.0\t0.0661\n",
    );
    write_file(
        &family.join("result_0.log"),
        "1S72_0:200-210\t\t10.0\t0.001\n",
    );

    let source = UserToolSource::new(ToolFormat::RnaMotifScanX, root.path());
    let motifs = source.get_motifs_for_structure(&structure()).await.unwrap();

    let hits = motifs.get("K-TURN").unwrap();
    let ids: Vec<&str> = hits.iter().map(|i| i.instance_id.as_str()).collect();
    assert_eq!(ids, vec!["RMSX_1S72_0_75_85_89_98", "RMSX_1S72_0_10_14"]);
    assert_eq!(hits[0].residues.len(), 13);
}

#[tokio::test]
async fn test_tool_override_directory() {
    let root = TempDir::new().unwrap();
    let custom = root.path().join("elsewhere");
    write_file(
        &custom.join("sarcin_ricin/Res_1s72"),
        "x\tlocation: 'A'5-'A'9\tScore: 3.0\tP-value: 0.001\n",
    );

    let source = UserToolSource::with_tool_dir(ToolFormat::RnaMotifScan, &custom);
    let motifs = source.get_motifs_for_structure(&structure()).await.unwrap();
    assert_eq!(motifs.get("SARCIN-RICIN").unwrap()[0].residues[0].chain, "A");
}
