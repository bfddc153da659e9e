use approx::assert_relative_eq;

use nbody::simulation::scenario::{random_cluster, ClusterSpec};
use nbody::{Bounds, NodeKind, Octree, SimError, SystemState, NVec3, DEFAULT_MAX_DEPTH};

fn cluster(n: usize, seed: u64) -> SystemState {
    let bodies = random_cluster(&ClusterSpec {
        n,
        seed,
        radius: 2.0,
        mass_min: 0.1,
        mass_max: 3.0,
        v_scale: 0.0,
    });
    SystemState::from_bodies(&bodies).unwrap()
}

fn build(sys: &SystemState) -> Octree {
    Octree::build(sys, Bounds::enclosing(sys.positions()))
}

fn at_rest(positions: &[NVec3], masses: &[f64]) -> SystemState {
    SystemState::new(positions.to_vec(), vec![NVec3::zeros(); positions.len()], masses.to_vec()).unwrap()
}

/// Bodies stored anywhere below `idx`
fn subtree_bodies(tree: &Octree, idx: usize, out: &mut Vec<usize>) {
    let node = tree.node(idx);
    match node.kind {
        NodeKind::Empty => {}
        NodeKind::Leaf(b) => out.push(b),
        NodeKind::Bucket(id) => out.extend_from_slice(tree.bucket(id)),
        NodeKind::Internal => {
            for c in node.child_indices() {
                subtree_bodies(tree, c, out);
            }
        }
    }
}

#[test]
fn root_aggregates_match_inputs() {
    let sys = cluster(250, 21);
    let tree = build(&sys);

    let total: f64 = sys.masses().iter().sum();
    let com = sys
        .positions()
        .iter()
        .zip(sys.masses())
        .fold(NVec3::zeros(), |acc, (x, &m)| acc + *x * m)
        / total;

    let root = tree.root();
    assert_relative_eq!(root.mass, total, max_relative = 1e-12);
    for k in 0..3 {
        assert_relative_eq!(root.com[k], com[k], max_relative = 1e-10, epsilon = 1e-12);
    }
}

#[test]
fn every_node_aggregates_its_subtree() {
    let sys = cluster(120, 8);
    let tree = build(&sys);

    for idx in 0..tree.node_count() {
        let mut bodies = Vec::new();
        subtree_bodies(&tree, idx, &mut bodies);

        let mass: f64 = bodies.iter().map(|&b| sys.masses()[b]).sum();
        let weighted = bodies
            .iter()
            .fold(NVec3::zeros(), |acc, &b| acc + sys.positions()[b] * sys.masses()[b]);

        let node = tree.node(idx);
        assert_relative_eq!(node.mass, mass, max_relative = 1e-12);
        for k in 0..3 {
            assert_relative_eq!(node.com[k], weighted[k] / mass, max_relative = 1e-10, epsilon = 1e-12);
        }
    }
}

#[test]
fn each_body_lands_in_exactly_one_leaf_inside_its_cube() {
    let sys = cluster(200, 2);
    let tree = build(&sys);

    let mut seen = vec![0usize; sys.len()];
    for node in tree.nodes() {
        if let NodeKind::Leaf(b) = node.kind {
            seen[b] += 1;
            assert!(node.bounds.contains(&sys.positions()[b]));
            assert!(node.children.iter().all(Option::is_none));
        }
    }
    assert!(seen.iter().all(|&c| c == 1));
    assert_eq!(tree.leaf_count(), sys.len());
    assert_eq!(tree.bucket_count(), 0);
}

#[test]
fn children_are_half_size_octants_of_their_parent() {
    let sys = cluster(64, 4);
    let tree = build(&sys);

    for node in tree.nodes() {
        for (octant, child) in node.children.iter().enumerate() {
            if let Some(c) = child {
                let child = tree.node(*c);
                assert_eq!(child.depth, node.depth + 1);
                assert_eq!(child.bounds, node.bounds.child(octant));
                assert!(child.mass > 0.0, "children are only created for occupied octants");
            }
        }
    }
}

#[test]
fn root_bounds_enclose_all_bodies() {
    let sys = cluster(100, 6);
    let tree = build(&sys);
    assert!(sys.positions().iter().all(|p| tree.root().bounds.contains(p)));
}

#[test]
fn empty_tree_has_an_empty_root() {
    let tree = build(&at_rest(&[], &[]));
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.root().kind, NodeKind::Empty);
    assert_eq!(tree.root().mass, 0.0);
}

#[test]
fn single_body_is_a_root_leaf() {
    let p = [NVec3::new(1.0, -2.0, 3.0)];
    let tree = build(&at_rest(&p, &[4.0]));
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.root().kind, NodeKind::Leaf(0));
    assert_eq!(tree.root().com, p[0]);
    assert_eq!(tree.root().mass, 4.0);
}

#[test]
fn identical_positions_terminate_at_max_depth() {
    let p = [NVec3::new(0.25, 0.25, 0.25), NVec3::new(0.25, 0.25, 0.25)];
    let tree = build(&at_rest(&p, &[1.0, 2.0]));

    assert_eq!(tree.depth(), DEFAULT_MAX_DEPTH);
    assert_eq!(tree.bucket_count(), 1);
    assert_eq!(tree.bucket(0), &[0, 1]);
    assert_relative_eq!(tree.root().mass, 3.0);
    assert_eq!(tree.root().com, p[0]);
}

#[test]
fn custom_depth_limit_merges_colocated_bodies() {
    let p = [
        NVec3::new(1.0, 1.0, 1.0),
        NVec3::new(1.0, 1.0, 1.0),
        NVec3::new(1.0, 1.0, 1.0),
        NVec3::new(-1.0, -1.0, -1.0),
    ];
    let m = [1.0, 1.0, 1.0, 5.0];
    let tree = Octree::build_with_depth(&at_rest(&p, &m), Bounds::enclosing(&p), 4);

    assert_eq!(tree.max_depth(), 4);
    assert_eq!(tree.depth(), 4);
    assert_eq!(tree.bucket_count(), 1);
    assert_eq!(tree.bucket(0).len(), 3);
    assert_relative_eq!(tree.root().mass, 8.0);
    assert_relative_eq!(tree.root().com.x, (3.0 - 5.0) / 8.0);
}

#[test]
fn walk_skips_only_the_target_body() {
    let p = [NVec3::new(0.0, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0)];
    let m = [1.0, 2.0];
    let tree = build(&at_rest(&p, &m));
    let g = nbody::Gravity { G: 1.0, softening: 0.0 };

    let a0 = tree.acceleration_on(0, &p, &m, &g, 0.5);
    let a1 = tree.acceleration_on(1, &p, &m, &g, 0.5);
    assert_relative_eq!(a0.x, 2.0, max_relative = 1e-14);
    assert_relative_eq!(a1.x, -1.0, max_relative = 1e-14);
}

#[test]
fn trees_are_only_built_from_consistent_states() {
    // unequal position and mass counts never reach the builder
    let err = SystemState::new(
        vec![NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0)],
        vec![NVec3::zeros(); 2],
        vec![1.0],
    )
    .unwrap_err();
    assert_eq!(
        err,
        SimError::LengthMismatch {
            positions: 2,
            velocities: 2,
            masses: 1
        }
    );
}
