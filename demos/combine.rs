use dfm_align::{
    CombineOperand, Dfm, DfmCombiner, DfmConfig, DfmResult, DfmSelector, PatternInput,
    SelectOptions,
};
use tracing_subscriber::EnvFilter;

// RUST_LOG=dfm_align=debug cargo run --example combine
fn main() -> DfmResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = DfmConfig::new().with_verbose(true);

    let a = Dfm::from_dense(["d1", "d2"], ["cat", "dog"], vec![vec![1.0, 2.0], vec![0.0, 1.0]])?;
    let b = Dfm::from_dense(["d3"], ["dog", "fox"], vec![vec![3.0, 1.0]])?;

    let combiner = DfmCombiner::new(config.clone());
    let stacked = combiner.combine_by_document(vec![a.clone().into(), b.clone().into()])?;
    print(&stacked.value);

    let widened = combiner.combine_by_feature(vec![
        a.clone().into(),
        a.clone().into(),
        CombineOperand::scalar(1.0),
    ])?;
    for advisory in &widened.advisories {
        println!("advisory: {advisory}");
    }
    print(&widened.value);
    print(&widened.value.compress_features());

    let selector = DfmSelector::new(config);
    let pattern = PatternInput::labels(["*o*"]);
    let selected = selector.select_features(&stacked.value, Some(&pattern), &SelectOptions::keep())?;
    print(&selected);

    let aligned = selector.select_features(&a, Some(&PatternInput::from(&b)), &SelectOptions::keep())?;
    print(&aligned);
    Ok(())
}

fn print(x: &Dfm) {
    println!("{} documents x {} features", x.ndoc(), x.nfeat());
    println!("\t{}", x.featnames().join("\t"));
    for (i, doc) in x.docnames().iter().enumerate() {
        let cells: Vec<String> = (0..x.nfeat()).map(|j| x.value_at(i, j).to_string()).collect();
        println!("{doc}\t{}", cells.join("\t"));
    }
}
