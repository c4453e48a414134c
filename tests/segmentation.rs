// tests/segmentation.rs

mod support;

use std::collections::BTreeSet;
use std::sync::Arc;

use samplerank::search::StepLimit;
use samplerank::{Executor, FactorPool, Model, SampleRankLearner, Sampler, Trainer, Vector};
use support::{Boundaries, GapTemplate, ToggleBoundary};

fn trained() -> (Model<Boundaries>, Sampler<Boundaries, support::SegmentationObjective>) {
    let config = support::config();
    let mut model = Model::new(Executor::from_config(&config.executor).unwrap())
        .with_template(GapTemplate)
        .unwrap();
    let mut sampler = Sampler::from_config(support::objective(), &config.sampler)
        .with_explorer(ToggleBoundary);
    let mut learner = SampleRankLearner::from_config(&config);
    let mut trainer = Trainer::from_config(&config);

    let run = trainer
        .train(
            &mut sampler,
            &mut model,
            &mut learner,
            &support::unsegmented,
            &support::corpus(),
        )
        .unwrap();

    assert_eq!(run.epochs.len(), 8);
    assert!(run.epochs.iter().all(|e| e.failed == 0 && e.instances == 3));
    assert!(run.epochs[0].updates > 0);
    // Training chains follow the objective, so every one ends on the gold.
    for state in run.final_states.iter().flatten() {
        assert_eq!(state.objective_score(), 1.0);
    }
    (model, sampler)
}

#[test_log::test]
fn greedy_prediction_finds_the_word_boundary() {
    let (model, mut sampler) = trained();
    let trainer = Trainer::from_config(&support::config());

    let evaluation = trainer
        .test(
            &mut sampler,
            &model,
            &support::unsegmented,
            &[support::labeled("ab cd", &[2])],
        )
        .unwrap();
    let state = &evaluation.states[0];
    assert_eq!(state.assignment().0, BTreeSet::from([2]));
    assert_eq!(state.objective_score(), 1.0);
    assert_eq!(evaluation.mean_objective, 1.0);
}

#[test_log::test]
fn prediction_without_gold_matches_test() {
    let (model, mut sampler) = trained();
    let trainer = Trainer::from_config(&support::config());

    let predicted = trainer
        .predict(
            &mut sampler,
            &model,
            &support::unsegmented,
            &[Arc::new("ab cd".to_string()), Arc::new("xy z".to_string())],
        )
        .unwrap();
    assert_eq!(predicted[0].assignment().0, BTreeSet::from([2]));
    assert_eq!(predicted[1].assignment().0, BTreeSet::from([2]));
    assert!(!predicted[0].is_objective_scored());
}

#[test_log::test]
fn learned_weights_prefer_boundaries_before_spaces() {
    let (model, _) = trained();
    let weights = model.weights("gap").unwrap();
    assert!(
        weights.get("boundary=true|left=alpha|right=space")
            > weights.get("boundary=false|left=alpha|right=space")
    );
    assert!(
        weights.get("boundary=false|left=alpha|right=alpha")
            > weights.get("boundary=true|left=alpha|right=alpha")
    );
}

#[test_log::test]
fn saved_model_predicts_the_same() {
    let (model, mut sampler) = trained();
    let dir = tempfile::tempdir().unwrap();
    model.save_weights(dir.path()).unwrap();
    assert!(dir.path().join("gap.weights.tsv").is_file());

    let mut reloaded = Model::new(Executor::sequential())
        .with_template(GapTemplate)
        .unwrap();
    reloaded.load_weights(dir.path()).unwrap();
    assert_eq!(reloaded.weights("gap"), model.weights("gap"));

    let trainer = Trainer::from_config(&support::config());
    let instances = [Arc::new("foo bar".to_string())];
    let original = trainer
        .predict(&mut sampler, &model, &support::unsegmented, &instances)
        .unwrap();
    let restored = trainer
        .predict(&mut sampler, &reloaded, &support::unsegmented, &instances)
        .unwrap();
    assert_eq!(original[0].assignment(), restored[0].assignment());
    assert_eq!(original[0].model_score(), restored[0].model_score());
    assert_eq!(restored[0].assignment().0, BTreeSet::from([3]));
}

#[test_log::test]
fn long_inputs_still_rank_candidates() {
    let mut model = Model::new(Executor::sequential())
        .with_template(GapTemplate)
        .unwrap();
    let weights: Vector = [
        ("boundary=false|left=alpha|right=alpha", 10.0),
        ("boundary=false|left=alpha|right=space", 10.0),
        ("boundary=false|left=space|right=alpha", 10.0),
        ("boundary=true|left=alpha|right=space", 30.0),
    ]
    .into_iter()
    .collect();
    model.set_weights("gap", weights).unwrap();

    // 120 gaps at 10 each put every state far past exp's range.
    let text = Arc::new(format!("{} {}", "a".repeat(60), "b".repeat(60)));
    let mut sampler = Sampler::new(support::objective(), StepLimit::new(2))
        .with_explorer(ToggleBoundary);
    let chain = sampler
        .generate_chain(&model, &FactorPool::new(), support::unsegmented(&text), None)
        .unwrap();

    let last = &chain.final_state;
    assert!(last.model_score().is_infinite());
    assert_eq!(last.linear_score(), 1220.0);
    assert_eq!(last.assignment().0, BTreeSet::from([60]));
    assert_eq!(chain.accepted, 1);
}
