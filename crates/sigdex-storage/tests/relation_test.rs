//! End-to-end tests for signature-indexed relations:
//! - create / close / reopen lifecycle
//! - insert across data page boundaries
//! - partial-match queries under all three signature schemes
//! - agreement between page-level schemes and the full scan

use tempfile::tempdir;

use sigdex_common::{RelationOptions, SigEncoding};
use sigdex_storage::{Relation, SigScheme};

const ALL_SCHEMES: [SigScheme; 4] = [
    SigScheme::Tuple,
    SigScheme::Page,
    SigScheme::BitSlice,
    SigScheme::None,
];

fn run_query(rel: &Relation, pattern: &str, scheme: SigScheme) -> Vec<String> {
    let mut q = rel.query(pattern, scheme).unwrap();
    q.run().unwrap().iter().map(|t| t.to_string()).collect()
}

/// Small bank-accounts relation: id, branch, owner, balance.
fn accounts(dir: &std::path::Path) -> Relation {
    let options = RelationOptions {
        nattrs: 4,
        tuple_size: 64,
        bits_per_value: 4,
        tsig_bits: 128,
        psig_bits: 256,
        bsig_bits: 1024,
        encoding: SigEncoding::Simc,
    };
    let mut rel = Relation::create(dir.join("accounts"), &options).unwrap();
    let rows = [
        "1001,Perryridge,Fowler,6000",
        "1002,Downtown,Smith,5300",
        "1003,Perryridge,Green,8000",
        "1004,Mianus,Clark,1200",
        "1005,Downtown,Fowler,900",
    ];
    for row in rows {
        let values: Vec<&str> = row.split(',').collect();
        rel.insert(&values).unwrap();
    }
    rel
}

#[test]
fn test_partial_match_agrees_across_schemes() {
    let dir = tempdir().unwrap();
    let rel = accounts(dir.path());

    for scheme in ALL_SCHEMES {
        let hits = run_query(&rel, "?,Perryridge,?,?", scheme);
        assert_eq!(
            hits,
            ["1001,Perryridge,Fowler,6000", "1003,Perryridge,Green,8000"],
            "scheme {:?}",
            scheme
        );

        let hits = run_query(&rel, "?,?,Fowler,?", scheme);
        assert_eq!(
            hits,
            ["1001,Perryridge,Fowler,6000", "1005,Downtown,Fowler,900"],
            "scheme {:?}",
            scheme
        );

        let hits = run_query(&rel, "1004,?,?,?", scheme);
        assert_eq!(hits, ["1004,Mianus,Clark,1200"], "scheme {:?}", scheme);

        let hits = run_query(&rel, "9999,Nowhere,Nobody,0", scheme);
        assert!(hits.is_empty(), "scheme {:?}", scheme);
    }
}

#[test]
fn test_conjunctive_pattern_narrows_results() {
    let dir = tempdir().unwrap();
    let rel = accounts(dir.path());

    for scheme in ALL_SCHEMES {
        let hits = run_query(&rel, "?,Downtown,Fowler,?", scheme);
        assert_eq!(hits, ["1005,Downtown,Fowler,900"], "scheme {:?}", scheme);
    }
}

#[test]
fn test_all_wildcard_query_returns_everything() {
    let dir = tempdir().unwrap();
    let rel = accounts(dir.path());

    for scheme in ALL_SCHEMES {
        let hits = run_query(&rel, "?,?,?,?", scheme);
        assert_eq!(hits.len(), 5, "scheme {:?}", scheme);
    }
}

#[test]
fn test_reopened_relation_answers_queries() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("accounts");
    {
        let mut rel = accounts(dir.path());
        assert_eq!(rel.base(), base);
        rel.close().unwrap();
    }

    let rel = Relation::open(&base).unwrap();
    assert_eq!(rel.params().ntups, 5);
    for scheme in ALL_SCHEMES {
        let hits = run_query(&rel, "?,Mianus,?,?", scheme);
        assert_eq!(hits, ["1004,Mianus,Clark,1200"], "scheme {:?}", scheme);
    }
}

#[test]
fn test_growth_over_multiple_data_pages() {
    let dir = tempdir().unwrap();
    // tuple_size 1300 leaves room for 3 tuples per 4KB data page
    let options = RelationOptions {
        nattrs: 2,
        tuple_size: 1300,
        bits_per_value: 5,
        tsig_bits: 96,
        psig_bits: 128,
        bsig_bits: 512,
        encoding: SigEncoding::Simc,
    };
    let mut rel = Relation::create(dir.path().join("wide"), &options).unwrap();
    assert_eq!(rel.params().tup_pp, 3);

    for i in 0..8 {
        let key = format!("k{}", i);
        let val = format!("v{}", i % 2);
        rel.insert(&[key.as_str(), val.as_str()]).unwrap();
    }

    // 8 tuples at 3 per page -> 3 data pages, 3 page signatures
    assert_eq!(rel.params().ntups, 8);
    assert_eq!(rel.params().npages, 3);
    assert_eq!(rel.params().npsigs, 3);
    assert_eq!(rel.params().ntsigs, 8);

    for scheme in ALL_SCHEMES {
        let hits = run_query(&rel, "?,v0", scheme);
        assert_eq!(
            hits,
            ["k0,v0", "k2,v0", "k4,v0", "k6,v0"],
            "scheme {:?}",
            scheme
        );

        let hits = run_query(&rel, "k7,?", scheme);
        assert_eq!(hits, ["k7,v1"], "scheme {:?}", scheme);
    }
}

#[test]
fn test_page_and_bitslice_probes_agree() {
    let dir = tempdir().unwrap();
    let options = RelationOptions {
        nattrs: 3,
        tuple_size: 1000,
        bits_per_value: 4,
        tsig_bits: 128,
        psig_bits: 128,
        bsig_bits: 256,
        encoding: SigEncoding::Simc,
    };
    let mut rel = Relation::create(dir.path().join("r"), &options).unwrap();

    for i in 0..20 {
        let a = format!("a{}", i % 7);
        let b = format!("b{}", i % 3);
        let c = format!("c{}", i);
        rel.insert(&[a.as_str(), b.as_str(), c.as_str()]).unwrap();
    }
    let npages = rel.params().npages as usize;
    assert!(npages > 1);

    // both probes must produce the same candidate set for any pattern:
    // they test the same page signatures, stored row-wise vs column-wise
    for pattern in ["a3,?,?", "?,b1,?", "a0,b0,?", "?,?,c13", "zz,?,?"] {
        let mut pq = rel.query(pattern, SigScheme::Page).unwrap();
        let psig_pages: Vec<usize> = pq
            .candidate_pages()
            .unwrap()
            .ones()
            .filter(|&p| p < npages)
            .collect();

        let mut bq = rel.query(pattern, SigScheme::BitSlice).unwrap();
        let bsig_pages: Vec<usize> = bq
            .candidate_pages()
            .unwrap()
            .ones()
            .filter(|&p| p < npages)
            .collect();

        assert_eq!(psig_pages, bsig_pages, "pattern {:?}", pattern);
    }
}

#[test]
fn test_no_false_negatives_bulk() {
    let dir = tempdir().unwrap();
    let options = RelationOptions {
        nattrs: 2,
        // narrow signatures to force false positives, never false negatives
        tuple_size: 800,
        bits_per_value: 3,
        tsig_bits: 32,
        psig_bits: 32,
        bsig_bits: 128,
        encoding: SigEncoding::Simc,
    };
    let mut rel = Relation::create(dir.path().join("r"), &options).unwrap();

    for i in 0..50 {
        let key = format!("key{}", i);
        let val = format!("val{}", i);
        rel.insert(&[key.as_str(), val.as_str()]).unwrap();
    }

    for i in 0..50 {
        let pattern = format!("key{},?", i);
        let expected = format!("key{},val{}", i, i);
        for scheme in ALL_SCHEMES {
            let hits = run_query(&rel, &pattern, scheme);
            assert_eq!(hits, [expected.clone()], "scheme {:?}", scheme);
        }
    }
}

#[test]
fn test_probe_stats_reflect_scheme_costs() {
    let dir = tempdir().unwrap();
    let rel = accounts(dir.path());

    let mut q = rel.query("?,Perryridge,?,?", SigScheme::Tuple).unwrap();
    q.run().unwrap();
    // one signature per tuple, all on one tsig page
    assert_eq!(q.stats().sigs_read, 5);
    assert_eq!(q.stats().sig_pages_read, 1);

    let mut q = rel.query("?,Perryridge,?,?", SigScheme::Page).unwrap();
    q.run().unwrap();
    // one signature per data page
    assert_eq!(q.stats().sigs_read, 1);

    let mut q = rel.query("?,Perryridge,?,?", SigScheme::BitSlice).unwrap();
    q.run().unwrap();
    // one column per set bit of the query descriptor, at most 4 for one value
    assert!(q.stats().sigs_read <= 4);

    let mut q = rel.query("?,Perryridge,?,?", SigScheme::None).unwrap();
    q.run().unwrap();
    assert_eq!(q.stats().sigs_read, 0);
    assert_eq!(q.stats().data_pages_read, 1);
    assert_eq!(q.stats().tuples_examined, 5);
}
