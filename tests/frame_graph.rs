use framegraph::{FrameGraph, FrameId, SceneError};
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
    )
}

fn randomize(frames: &mut FrameGraph, id: FrameId, rng: &mut StdRng) {
    let axis = random_vec(rng, 1.0).try_normalize().unwrap_or(Vec3::Y);
    let rotation = Quat::from_axis_angle(axis, rng.gen_range(-3.0..3.0));
    let scale = Vec3::new(
        rng.gen_range(0.8..1.25),
        rng.gen_range(0.8..1.25),
        rng.gen_range(0.8..1.25),
    );

    frames.set_local_transform(id, random_vec(rng, 2.0), rotation, scale);
}

/// Builds a random tree with at least one branch `depth` frames deep and
/// returns every frame in creation order.
fn random_tree(rng: &mut StdRng, depth: usize, extra: usize) -> (FrameGraph, Vec<FrameId>) {
    let mut frames = FrameGraph::new();
    let mut ids = vec![frames.add_frame("root")];
    randomize(&mut frames, ids[0], rng);

    for level in 1..=depth {
        let id = frames.add_frame(format!("chain-{}", level));
        randomize(&mut frames, id, rng);
        frames.adopt(ids[level - 1], id).unwrap();
        ids.push(id);
    }

    for index in 0..extra {
        let parent = ids[rng.gen_range(0..ids.len())];
        let id = frames.add_frame(format!("extra-{}", index));
        randomize(&mut frames, id, rng);
        frames.adopt(parent, id).unwrap();
        ids.push(id);
    }

    (frames, ids)
}

#[test]
fn point_round_trip_through_random_trees() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..20 {
        let (frames, ids) = random_tree(&mut rng, 5, 10);

        for _ in 0..20 {
            let a = ids[rng.gen_range(0..ids.len())];
            let b = ids[rng.gen_range(0..ids.len())];
            let point = random_vec(&mut rng, 1.0);

            let there = frames.convert_point_to(a, point, b).unwrap();
            let back = frames.convert_point_to(b, there, a).unwrap();
            assert!(
                back.abs_diff_eq(point, 1e-4),
                "{:?} came back as {:?}",
                point,
                back
            );
        }
    }
}

#[test]
fn deepest_frame_round_trips_through_root() {
    let mut rng = StdRng::seed_from_u64(7);
    let (frames, ids) = random_tree(&mut rng, 4, 0);
    let (root, leaf) = (ids[0], ids[4]);

    let point = Vec3::new(0.25, -0.5, 0.75);
    let in_root = frames.convert_point_to(leaf, point, root).unwrap();
    let back = frames.convert_point_to(root, in_root, leaf).unwrap();
    assert!(back.abs_diff_eq(point, 1e-4));
}

#[test]
fn world_matrix_matches_product_of_locals() {
    let mut rng = StdRng::seed_from_u64(42);
    let (frames, ids) = random_tree(&mut rng, 6, 0);

    let expected = ids
        .iter()
        .map(|&id| frames.local_matrix(id).unwrap())
        .fold(glam::Mat4::IDENTITY, |world, local| world * local);

    let leaf = *ids.last().unwrap();
    assert!(frames.world_matrix(leaf).unwrap().abs_diff_eq(expected, 1e-3));
}

#[test]
fn edits_after_reads_are_never_stale() {
    let mut rng = StdRng::seed_from_u64(99);
    let (mut frames, ids) = random_tree(&mut rng, 4, 6);
    let leaf = ids[4];

    let before = frames.world_position(leaf).unwrap();
    frames.translate(ids[0], Vec3::new(0.0, 0.0, 0.0));
    assert!(frames.world_position(leaf).unwrap().abs_diff_eq(before, 1e-5));

    frames.set_local_translation(ids[0], frames.transform(ids[0]).unwrap().translation() + Vec3::X);
    let after = frames.world_position(leaf).unwrap();
    assert!(after.abs_diff_eq(before + Vec3::X, 1e-4));
}

#[test]
fn cycles_are_rejected_anywhere_in_a_chain() {
    let mut rng = StdRng::seed_from_u64(3);
    let (mut frames, ids) = random_tree(&mut rng, 4, 0);

    for &descendant in &ids[1..] {
        let result = frames.adopt(descendant, ids[0]);
        assert_eq!(
            result,
            Err(SceneError::Cycle {
                child: ids[0],
                parent: descendant
            })
        );
    }

    assert_eq!(frames.roots(), vec![ids[0]]);
}
