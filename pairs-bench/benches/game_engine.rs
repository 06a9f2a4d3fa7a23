//! Pairs Benchmark Suite
//!
//! Targets for per-click work in a UI frame:
//!   build_deck_hard ................ < 20μs
//!   score_calculate ................ < 1μs
//!   board_play_through_hard ........ < 200μs
//!   storage_save_session_memory .... < 1ms

use chrono::Utc;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use pairs_core::board::{Board, Phase};
use pairs_core::deck::{Deck, build_deck};
use pairs_core::difficulty::Difficulty;
use pairs_core::persistence::{GameStorage, SessionRecord};
use pairs_core::score::ScoreEngine;
use pairs_core::types::{CardId, SessionId};

/// Benchmark: shuffled 36-card deck.
fn bench_build_deck(c: &mut Criterion) {
    let level = Difficulty::Hard.level();
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("build_deck_hard", |b| {
        b.iter(|| black_box(build_deck(black_box(level), &mut rng)));
    });
}

/// Benchmark: one score breakdown.
fn bench_score(c: &mut Criterion) {
    c.bench_function("score_calculate", |b| {
        b.iter(|| {
            black_box(ScoreEngine::calculate(
                black_box(42),
                black_box(3),
                black_box(Difficulty::Medium),
            ))
        });
    });
}

/// Pairs of card ids in an order that finds every pair on the first try.
fn perfect_order(deck: &Deck) -> Vec<(CardId, CardId)> {
    let cards = deck.cards();
    cards
        .iter()
        .enumerate()
        .filter_map(|(i, first)| {
            cards[i + 1..]
                .iter()
                .find(|c| c.face == first.face)
                .map(|second| (first.id, second.id))
        })
        .collect()
}

/// Benchmark: select and settle every pair of a hard board.
fn bench_play_through(c: &mut Criterion) {
    let deck = build_deck(Difficulty::Hard.level(), &mut StdRng::seed_from_u64(11));
    let order = perfect_order(&deck);

    c.bench_function("board_play_through_hard", |b| {
        b.iter_batched(
            || {
                let mut board = Board::new();
                board.start(deck.clone());
                board
            },
            |mut board| {
                for &(first, second) in &order {
                    board.select(first);
                    board.select(second);
                    board.settle();
                }
                assert_eq!(board.phase(), Phase::Complete);
                black_box(board)
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: append to a full history and update metrics.
fn bench_save_session(c: &mut Criterion) {
    let storage = GameStorage::in_memory();
    let record = |score: u32| {
        let now = Utc::now();
        SessionRecord {
            id: SessionId::new(),
            difficulty: Difficulty::Easy,
            start_time: now,
            end_time: now,
            time_elapsed: 30,
            score,
            mistakes: 2,
            turns: 8,
            stars: 2,
            max_possible_score: 1600,
            completed: true,
            card_pairs: 6,
        }
    };
    for i in 0..100 {
        storage.save_game_session(&record(i * 10));
    }

    c.bench_function("storage_save_session_memory", |b| {
        b.iter(|| black_box(storage.save_game_session(&record(1200))));
    });
}

criterion_group!(
    benches,
    bench_build_deck,
    bench_score,
    bench_play_through,
    bench_save_session,
);
criterion_main!(benches);
