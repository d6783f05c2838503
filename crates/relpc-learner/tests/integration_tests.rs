//! Integration tests for relpc-learner
//!
//! Orientation is exercised with the d-separation oracle so the outcome
//! depends only on the rules; skeleton properties are checked on generated
//! chain data.

use relpc_domain::{Dependency, Model, OrientationRule, RelationalData, Schema, Variable};
use relpc_fixtures::{chain_fixture, collider_skeleton_data, collider_truth};
use relpc_learner::{DSeparationOracle, LearnerConfig, LearnerError, ModelSupport, RelationalPc, Session};
use std::collections::BTreeSet;

fn var(name: &str) -> Variable {
    name.parse().unwrap()
}

fn oracle_run(support: &ModelSupport, truth: &Model, depth: usize) -> Model {
    let mut pc = RelationalPc::with_test(support, DSeparationOracle::new(truth));
    pc.set_significance_threshold_adjust(0.01).unwrap();
    pc.set_strength_of_effect_threshold(0.1).unwrap();
    pc.identify_skeleton(depth).unwrap();
    pc.orient_edges().unwrap();
    pc.model()
}

/// x --> y <-- z and y --> w, over a schema where every entity hangs off y
fn collider_with_child() -> (Session, Model) {
    let schema = Schema::new("fan")
        .with_entity("x", &["value"])
        .with_entity("y", &["value"])
        .with_entity("z", &["value"])
        .with_entity("w", &["value"])
        .with_relationship("XY", "x", "y", &[])
        .with_relationship("ZY", "z", "y", &[])
        .with_relationship("YW", "y", "w", &[]);
    let mut data = RelationalData::new(schema);
    for t in ["x", "y", "z", "w"] {
        let item = data.add_entity(t, 1).unwrap();
        data.set_value(&item, "value", 0).unwrap();
    }
    data.add_relationship("XY", 1, 1, 1).unwrap();
    data.add_relationship("ZY", 1, 1, 1).unwrap();
    data.add_relationship("YW", 1, 1, 1).unwrap();

    let truth = Model::from_dependencies([
        Dependency::directed(var("x.value"), var("y.value")),
        Dependency::directed(var("z.value"), var("y.value")),
        Dependency::directed(var("y.value"), var("w.value")),
    ]);
    (Session::from_data("fan", data), truth)
}

#[test]
fn test_oracle_orients_collider() {
    let session = Session::from_data("star", collider_skeleton_data().unwrap());
    let support = session.model_support(2).unwrap();
    let model = oracle_run(&support, &collider_truth(), 2);

    assert_eq!(model.edge_count(), 2);
    for dep in collider_truth().dependencies() {
        let (cause, effect) = (dep.cause().unwrap(), dep.effect().unwrap());
        assert!(model.is_directed(cause, effect), "{} should be oriented", dep);
    }
}

#[test]
fn test_oracle_propagates_through_known_non_collider() {
    let (session, truth) = collider_with_child();
    let support = session.model_support(2).unwrap();
    let model = oracle_run(&support, &truth, 2);

    assert_eq!(model.edge_count(), 3);
    let dep = model.dependency(&var("y.value"), &var("w.value")).unwrap();
    assert!(dep.points(&var("y.value"), &var("w.value")));
    assert_eq!(dep.rule, Some(OrientationRule::KnownNonCollider));

    // Every oriented edge carries a rule tag
    let tagged = model.dependencies().iter().filter(|d| d.rule.is_some()).count();
    assert_eq!(tagged, model.oriented_count());
}

#[test]
fn test_oracle_leaves_chain_unoriented() {
    // A chain has no collider, so nothing is compelled
    let fixture = chain_fixture(20, 5).unwrap();
    let session = Session::from_data("chain", fixture.data);
    let support = session.model_support(2).unwrap();
    let model = oracle_run(&support, &fixture.truth, 3);

    let edges: BTreeSet<_> = model.dependencies().iter().map(|d| d.key()).collect();
    let expected: BTreeSet<_> = fixture.truth.dependencies().iter().map(|d| d.key()).collect();
    assert_eq!(edges, expected);
    assert_eq!(model.oriented_count(), 0);

    // The out-of-range check found the separating sets beyond the threshold
    let sep = model.constraint(&var("b.value"), &var("d.value")).unwrap();
    assert_eq!(sep.conditioning, vec![var("a.value")]);
}

#[test]
fn test_skeleton_is_subgraph_of_candidates() {
    let fixture = chain_fixture(300, 11).unwrap();
    let session = Session::from_data("chain", fixture.data);
    let support = session.model_support(2).unwrap();
    let candidates: BTreeSet<(Variable, Variable)> = support.candidate_pairs().into_iter().collect();

    let mut pc = RelationalPc::from_config(&support, &LearnerConfig::default()).unwrap();
    pc.identify_skeleton(2).unwrap();

    for dep in pc.dependencies() {
        assert!(candidates.contains(&dep.key()), "{} is not a candidate", dep);
        assert!(!dep.is_directed());
    }
}

#[test]
fn test_edge_count_non_increasing_in_depth() {
    let fixture = chain_fixture(300, 12).unwrap();
    let session = Session::from_data("chain", fixture.data);
    let support = session.model_support(2).unwrap();

    let counts: Vec<usize> = (0..=2)
        .map(|depth| {
            let mut pc = RelationalPc::from_config(&support, &LearnerConfig::default()).unwrap();
            pc.identify_skeleton(depth).unwrap();
            pc.model().edge_count()
        })
        .collect();
    assert!(counts.windows(2).all(|w| w[1] <= w[0]), "counts {:?}", counts);
}

#[test]
fn test_conditioning_sets_stay_within_neighborhood() {
    let fixture = chain_fixture(300, 13).unwrap();
    let session = Session::from_data("chain", fixture.data);
    let support = session.model_support(2).unwrap();

    let mut pc = RelationalPc::from_config(&support, &LearnerConfig::default()).unwrap();
    pc.identify_skeleton(2).unwrap();

    let threshold = support.hop_threshold();
    for c in pc.constraints() {
        for v in &c.conditioning {
            let near = |other: &Variable| support.variable_distance(v, other).is_some_and(|d| d <= threshold);
            assert!(near(&c.first) || near(&c.second), "{} conditions on a distant variable", c);
        }
    }
}

#[test]
fn test_orientation_preserves_edges() {
    let fixture = chain_fixture(300, 14).unwrap();
    let session = Session::from_data("chain", fixture.data);
    let support = session.model_support(2).unwrap();

    let mut pc = RelationalPc::from_config(&support, &LearnerConfig::default()).unwrap();
    pc.identify_skeleton(2).unwrap();
    let skeleton = pc.model();
    pc.orient_edges().unwrap();
    let oriented = pc.model();

    let before: Vec<_> = skeleton.dependencies().iter().map(|d| d.key()).collect();
    let after: Vec<_> = oriented.dependencies().iter().map(|d| d.key()).collect();
    assert_eq!(before, after);
    assert_eq!(skeleton.constraints(), oriented.constraints());
}

#[test]
fn test_invalid_support_configuration() {
    let fixture = chain_fixture(10, 1).unwrap();
    let session = Session::from_data("chain", fixture.data);
    assert!(matches!(session.model_support(-2), Err(LearnerError::Configuration(_))));

    let config = LearnerConfig {
        strength_of_effect_threshold: -0.5,
        ..LearnerConfig::default()
    };
    let support = session.model_support(2).unwrap();
    assert!(RelationalPc::from_config(&support, &config).is_err());
}
