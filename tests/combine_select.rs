use dfm_align::{
    combine_by_document, combine_by_feature, keep_features, remove_features, select_features,
    AdvisoryCode, CombineOperand, Dfm, DfmConfig, DfmError, PatternInput, SelectOptions, ValueType,
};

/// xorshift32
struct Rng(u32);

impl Rng {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        self.next_u32() as usize % n
    }
}

const VOCAB: [&str; 12] = [
    "cat", "dog", "fox", "emu", "owl", "bee", "ant", "elk", "yak", "gnu", "ram", "cod",
];

/// Random dfm over a random subset of the vocabulary; documents get `tag`
fn random_dfm(rng: &mut Rng, tag: &str) -> Dfm {
    let ndoc = 1 + rng.below(4);
    let feats: Vec<&str> = VOCAB.iter().copied().filter(|_| rng.below(2) == 0).collect();
    let feats = if feats.is_empty() { vec!["cat"] } else { feats };
    let rows = (0..ndoc)
        .map(|_| {
            feats
                .iter()
                .map(|_| if rng.below(3) == 0 { 0.0 } else { (1 + rng.below(5)) as f64 })
                .collect()
        })
        .collect();
    let docs: Vec<String> = (0..ndoc).map(|i| format!("{tag}{i}")).collect();
    Dfm::from_dense(docs, feats, rows).unwrap()
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scenario_row_combine() {
    let a = Dfm::from_dense(["d1", "d2"], ["cat", "dog"], vec![vec![1.0, 2.0], vec![0.0, 1.0]]).unwrap();
    let b = Dfm::from_dense(["d3"], ["dog", "fox"], vec![vec![3.0, 1.0]]).unwrap();
    let out = combine_by_document(vec![a.into(), b.into()], &DfmConfig::default()).unwrap();
    assert!(out.is_clean());
    let x = out.into_inner();
    assert_eq!(x.docnames(), &strings(&["d1", "d2", "d3"])[..]);
    let expected = [
        ("d1", [1.0, 2.0, 0.0]),
        ("d2", [0.0, 1.0, 0.0]),
        ("d3", [0.0, 3.0, 1.0]),
    ];
    for (doc, values) in expected {
        for (feat, v) in ["cat", "dog", "fox"].iter().zip(values) {
            assert_eq!(x.value(doc, feat), Some(v), "{doc}/{feat}");
        }
    }
}

#[test]
fn scenario_glob_with_length_filter() {
    let x = Dfm::from_dense(
        ["d1"],
        ["apple", "banana", "kiwi", "fig"],
        vec![vec![1.0, 1.0, 1.0, 1.0]],
    )
    .unwrap();
    let config = DfmConfig::default();
    let pattern = PatternInput::labels(["*i*"]);
    let options = SelectOptions::keep()
        .with_valuetype(ValueType::Glob)
        .with_case_insensitive(true);
    let out = select_features(&x, Some(&pattern), &options, &config).unwrap();
    assert_eq!(out.featnames(), &strings(&["kiwi", "fig"])[..]);
    let out = select_features(&x, Some(&pattern), &options.with_nchar(4, None), &config).unwrap();
    assert_eq!(out.featnames(), &strings(&["kiwi"])[..]);
}

#[test]
fn scenario_empty_remove_is_noop() {
    let mut rng = Rng(7);
    let config = DfmConfig::default();
    for _ in 0..20 {
        let x = random_dfm(&mut rng, "d");
        let empty = PatternInput::labels(Vec::<String>::new());
        let out = remove_features(&x, Some(&empty), &SelectOptions::default(), &config).unwrap();
        assert_eq!(out, x);
    }
}

#[test]
fn zero_feature_left_is_returned_unchanged() {
    let empty: Dfm = Dfm::from_dense(["d1", "d2"], Vec::<String>::new(), vec![vec![], vec![]]).unwrap();
    let other = Dfm::from_dense(["d1", "d2"], ["cat"], vec![vec![1.0], vec![2.0]]).unwrap();
    let out = combine_by_feature(vec![empty.clone().into(), other.into()], &DfmConfig::default())
        .unwrap();
    assert_eq!(out.value, empty);
    assert_eq!(out.value.nfeat(), 0);
}

#[test]
fn keep_without_pattern_is_identity() {
    let mut rng = Rng(0x9e37_79b9);
    let config = DfmConfig::default();
    for _ in 0..20 {
        let x = random_dfm(&mut rng, "d");
        let out = keep_features(&x, None, &SelectOptions::default(), &config).unwrap();
        assert_eq!(out, x);
        assert_eq!(out.meta(), x.meta());
    }
}

#[test]
fn keep_selection_is_idempotent() {
    let mut rng = Rng(42);
    let config = DfmConfig::default();
    let patterns = [
        (vec!["c*", "?o?"], ValueType::Glob),
        (vec!["[a-e].."], ValueType::Regex),
        (vec!["cat", "EMU"], ValueType::Fixed),
    ];
    for _ in 0..10 {
        let x = random_dfm(&mut rng, "d");
        for (p, valuetype) in &patterns {
            let pattern = PatternInput::labels(p.iter().copied());
            let options = SelectOptions::keep().with_valuetype(*valuetype);
            let once = select_features(&x, Some(&pattern), &options, &config).unwrap();
            let twice = select_features(&once, Some(&pattern), &options, &config).unwrap();
            assert_eq!(once, twice);
        }
    }
}

#[test]
fn reference_selection_yields_reference_features() {
    let mut rng = Rng(1234);
    let config = DfmConfig::default();
    for _ in 0..30 {
        let a = random_dfm(&mut rng, "a");
        let b = random_dfm(&mut rng, "b");
        let options = SelectOptions::keep().with_valuetype(ValueType::Fixed);
        let out = select_features(&a, Some(&PatternInput::from(&b)), &options, &config).unwrap();
        assert_eq!(out.featnames(), b.featnames());
        assert_eq!(out.docnames(), a.docnames());
        for (i, doc) in a.docnames().iter().enumerate() {
            for (j, feat) in b.featnames().iter().enumerate() {
                let expected = a.value(doc, feat).unwrap_or(0.0);
                assert_eq!(out.value_at(i, j), expected);
            }
        }
    }
}

#[test]
fn row_combine_of_disjoint_documents() {
    let mut rng = Rng(99);
    let config = DfmConfig::default();
    for _ in 0..30 {
        let a = random_dfm(&mut rng, "a");
        let b = random_dfm(&mut rng, "b");
        let out = combine_by_document(vec![a.clone().into(), b.clone().into()], &config).unwrap();
        assert!(out.is_clean());
        let x = &out.value;

        let mut union: Vec<&String> = a.featnames().iter().collect();
        union.extend(b.featnames().iter().filter(|f| !a.featnames().contains(f)));
        assert_eq!(x.ndoc(), a.ndoc() + b.ndoc());
        assert_eq!(x.nfeat(), union.len());
        assert_eq!(x.featnames().iter().collect::<Vec<_>>(), union);

        for source in [&a, &b] {
            for doc in source.docnames() {
                for feat in x.featnames() {
                    let expected = source.value(doc, feat).unwrap_or(0.0);
                    assert_eq!(x.value(doc, feat), Some(expected));
                }
            }
        }
    }
}

#[test]
fn column_combine_of_disjoint_features() {
    let a = Dfm::from_dense(["d1", "d2"], ["cat", "dog"], vec![vec![1.0, 0.0], vec![2.0, 3.0]]).unwrap();
    let b = Dfm::from_dense(["d1", "d2"], ["fox"], vec![vec![0.0], vec![4.0]]).unwrap();
    let out = combine_by_feature(vec![a.clone().into(), b.clone().into()], &DfmConfig::default())
        .unwrap();
    assert!(out.is_clean());
    assert_eq!(out.value.ndoc(), a.ndoc());
    assert_eq!(out.value.nfeat(), a.nfeat() + b.nfeat());
    assert_eq!(out.value.value("d2", "fox"), Some(4.0));
}

#[test]
fn column_combine_reports_and_compresses_duplicates() {
    let a = Dfm::from_dense(["d1"], ["cat", "dog"], vec![vec![1.0, 2.0]]).unwrap();
    let b = Dfm::from_dense(["d1"], ["dog"], vec![vec![5.0]]).unwrap();
    let out = combine_by_feature(
        vec![a.into(), b.into(), CombineOperand::named_column("size", vec![9.0])],
        &DfmConfig::default(),
    )
    .unwrap();
    // raised at each fold step that still carries the duplicate
    assert_eq!(
        out.codes(),
        vec![AdvisoryCode::DuplicateFeature, AdvisoryCode::DuplicateFeature]
    );
    assert_eq!(out.value.featnames(), &strings(&["cat", "dog", "dog", "size"])[..]);
    let compressed = out.value.compress_features();
    assert_eq!(compressed.featnames(), &strings(&["cat", "dog", "size"])[..]);
    assert_eq!(compressed.value("d1", "dog"), Some(7.0));
}

#[test]
fn row_combine_rejects_non_dfm_operand() {
    let a = Dfm::from_dense(["d1"], ["cat"], vec![vec![1.0]]).unwrap();
    let res = combine_by_document(
        vec![a.into(), CombineOperand::column(vec![1.0])],
        &DfmConfig::default(),
    );
    assert!(matches!(res, Err(DfmError::Type { .. })));
}

#[test]
fn config_drives_generated_names() {
    let config = DfmConfig::from_toml_str("generated_prefix = \"v\"").unwrap();
    let a = Dfm::from_dense(["d1"], ["cat"], vec![vec![1.0]]).unwrap();
    let out = combine_by_feature(
        vec![a.into(), CombineOperand::scalar(2.0), CombineOperand::scalar(3.0)],
        &config,
    )
    .unwrap();
    assert_eq!(out.value.featnames(), &strings(&["cat", "v", "v1"])[..]);
    assert!(out.is_clean());
}

#[test]
fn stored_zeros_do_not_break_identity() {
    let with_zero = sprs::CsMat::new((2, 2), vec![0, 2, 3], vec![0, 1, 1], vec![1.0, 0.0, 4.0]);
    let x = Dfm::new(["d1", "d2"], ["cat", "dog"], with_zero).unwrap();
    assert_eq!(x.nnz(), 2);
    let out = keep_features(&x, None, &SelectOptions::default(), &DfmConfig::default()).unwrap();
    assert_eq!(out, x);
    assert_eq!(out.nnz(), x.nnz());
}
