use std::collections::HashMap;

use rand::{SeedableRng, rngs::StdRng};
use sposhcli::management::move_to_front_sequence;

// Replay a move sequence the way the remote API applies it: take the track
// at the given position and put it at the front
fn apply_moves(tracks: &[u32], moves: &[u32]) -> Vec<u32> {
    let mut result = tracks.to_vec();
    for &from in moves {
        let track = result.remove(from as usize);
        result.insert(0, track);
    }
    result
}

#[test]
fn test_sequence_length_matches_track_count() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(move_to_front_sequence(0, &mut rng).len(), 0);
    assert_eq!(move_to_front_sequence(1, &mut rng).len(), 1);
    // a 2-element playlist issues exactly 2 move calls
    assert_eq!(move_to_front_sequence(2, &mut rng).len(), 2);
    assert_eq!(move_to_front_sequence(500, &mut rng).len(), 500);
}

#[test]
fn test_sequence_draws_within_shrinking_window() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..100 {
        let total = 50;
        let moves = move_to_front_sequence(total, &mut rng);
        for (i, &position) in moves.iter().enumerate() {
            assert!(position >= i as u32);
            assert!(position < total);
        }
    }
}

#[test]
fn test_shuffle_preserves_the_multiset() {
    let mut rng = StdRng::seed_from_u64(3);
    // duplicates included on purpose
    let tracks = vec![1, 2, 2, 3, 4, 5, 5, 5, 6, 7];

    for _ in 0..200 {
        let moves = move_to_front_sequence(tracks.len() as u32, &mut rng);
        let mut shuffled = apply_moves(&tracks, &moves);
        shuffled.sort();
        let mut expected = tracks.clone();
        expected.sort();
        assert_eq!(shuffled, expected);
    }
}

// The move-to-front scheme is not the textbook swap-based reshuffle, so its
// uniformity is established empirically: over many runs on a 4-element
// playlist, every one of the 24 permutations must come up at roughly the
// same frequency.
#[test]
fn test_shuffle_uniformity_over_permutations() {
    let mut rng = StdRng::seed_from_u64(42);
    let tracks = vec![0, 1, 2, 3];
    let runs = 24_000;

    let mut frequencies: HashMap<Vec<u32>, u32> = HashMap::new();
    for _ in 0..runs {
        let moves = move_to_front_sequence(4, &mut rng);
        *frequencies.entry(apply_moves(&tracks, &moves)).or_insert(0) += 1;
    }

    // every permutation is reachable
    assert_eq!(frequencies.len(), 24);

    // and none is favored beyond sampling tolerance (expected 1000 each)
    let expected = runs / 24;
    for (permutation, count) in &frequencies {
        assert!(
            *count >= expected * 7 / 10 && *count <= expected * 13 / 10,
            "permutation {permutation:?} came up {count} times, expected about {expected}"
        );
    }
}

#[test]
fn test_shuffle_positions_are_unbiased() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 6u32;
    let runs = 12_000;

    // counts[track][position]
    let mut counts = vec![vec![0u32; n as usize]; n as usize];
    for _ in 0..runs {
        let tracks: Vec<u32> = (0..n).collect();
        let moves = move_to_front_sequence(n, &mut rng);
        for (position, track) in apply_moves(&tracks, &moves).into_iter().enumerate() {
            counts[track as usize][position] += 1;
        }
    }

    let expected = runs / n;
    for track in 0..n as usize {
        for position in 0..n as usize {
            let count = counts[track][position];
            assert!(
                count >= expected * 7 / 10 && count <= expected * 13 / 10,
                "track {track} landed on position {position} {count} times, expected about {expected}"
            );
        }
    }
}
