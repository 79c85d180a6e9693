//! Store contract suite shared by every `GameStore` backend.
//!
//! Each function drives a fresh store through one behaviour and panics on
//! any deviation. Backend test files call them with their own store.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use xo_backend::domain::foundation::{GameId, UserId};
use xo_backend::domain::game::{Coordinate, GameRejection, GameSnapshot, GameStatus};
use xo_backend::ports::{GameStore, GameStoreError};

pub fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

pub fn rejection(result: Result<GameSnapshot, GameStoreError>) -> GameRejection {
    match result {
        Ok(snapshot) => panic!("expected a rejection, got {:?}", snapshot),
        Err(GameStoreError::Rejected(rejection)) => rejection,
        Err(other) => panic!("expected a rejection, got {:?}", other),
    }
}

/// Alice hosts and Bob joins; returns (game, first mover, second mover).
pub async fn start_game(store: &dyn GameStore) -> (GameSnapshot, UserId, UserId) {
    let created = store.create_game(&user("alice")).await.unwrap();
    let joined = store.join_game(&user("bob"), &created.id).await.unwrap();
    let first = joined.turn.clone();
    let second = if first == user("alice") {
        user("bob")
    } else {
        user("alice")
    };
    (joined, first, second)
}

pub async fn alice_and_bob_play_to_a_win(store: &dyn GameStore) {
    let created = store.create_game(&user("alice")).await.unwrap();
    assert_eq!(created.player_x, user("alice"));
    assert_eq!(created.turn, user("alice"));
    assert_eq!(created.board.marked_count(), 0);
    assert!(!created.finished);
    assert_eq!(created.status, GameStatus::AwaitingOpponent);

    let joined = store.join_game(&user("bob"), &created.id).await.unwrap();
    assert_eq!(joined.player_o, Some(user("bob")));
    assert!(joined.turn == user("alice") || joined.turn == user("bob"));
    assert_eq!(joined.status, GameStatus::InProgress);

    let first = joined.turn.clone();
    let second = if first == user("alice") { user("bob") } else { user("alice") };

    assert_eq!(
        rejection(store.apply_move(&second, "A1").await),
        GameRejection::NotYourTurn
    );

    let after = store.apply_move(&first, "A1").await.unwrap();
    let first_mark = after.mark_of(&first).unwrap();
    assert_eq!(after.board.get(Coordinate::new(0, 0).unwrap()), Some(first_mark));
    assert_eq!(after.turn, second);
    assert!(!after.finished);

    store.apply_move(&second, "B1").await.unwrap();
    store.apply_move(&first, "A2").await.unwrap();
    store.apply_move(&second, "B2").await.unwrap();
    let won = store.apply_move(&first, "A3").await.unwrap();

    assert!(won.finished);
    assert_eq!(won.winner, Some(first.clone()));
    assert_eq!(won.status, GameStatus::Finished);
    assert!(won.open_coordinates().is_empty());

    assert_eq!(
        rejection(store.apply_move(&second, "C1").await),
        GameRejection::NotYourTurn
    );
    assert_eq!(
        rejection(store.apply_move(&first, "C1").await),
        GameRejection::NotYourTurn
    );
}

pub async fn full_board_without_line_is_a_draw(store: &dyn GameStore) {
    let (_, first, second) = start_game(store).await;
    let script = [
        (&first, "A1"),
        (&second, "A2"),
        (&first, "A3"),
        (&second, "B2"),
        (&first, "B1"),
        (&second, "B3"),
        (&first, "C2"),
        (&second, "C1"),
    ];
    for (who, label) in script {
        let snap = store.apply_move(who, label).await.unwrap();
        assert!(!snap.finished, "finished early at {label}");
    }

    let last = store.apply_move(&first, "C3").await.unwrap();
    assert!(last.finished);
    assert!(last.winner.is_none());
    assert!(last.is_draw());
    assert!(last.board.is_full());
}

pub async fn lobby_lists_waiting_games_oldest_first(store: &dyn GameStore) {
    assert!(store.list_open_games(&user("zoe")).await.unwrap().is_empty());

    let mut expected = Vec::new();
    for host in ["h1", "h2", "h3"] {
        expected.push(store.create_game(&user(host)).await.unwrap().id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let started = store.create_game(&user("h4")).await.unwrap();
    store.join_game(&user("guest"), &started.id).await.unwrap();

    let lobby = store.list_open_games(&user("zoe")).await.unwrap();
    let listed: Vec<GameId> = lobby.iter().map(|e| e.game_id.clone()).collect();

    assert_eq!(listed, expected);
    assert_eq!(lobby[0].host, user("h1"));
    assert!(lobby.windows(2).all(|w| w[0].waiting_since <= w[1].waiting_since));
}

pub async fn join_rejections(store: &dyn GameStore) {
    let missing = GameId::new("missing0").unwrap();
    assert_eq!(
        rejection(store.join_game(&user("bob"), &missing).await),
        GameRejection::GameNotFound(missing)
    );

    let (game, _, _) = start_game(store).await;
    assert_eq!(
        rejection(store.join_game(&user("carol"), &game.id).await),
        GameRejection::GameFull(game.id.clone())
    );
}

pub async fn move_rejections(store: &dyn GameStore) {
    assert_eq!(
        rejection(store.apply_move(&user("nobody"), "A1").await),
        GameRejection::NotInGame
    );

    let (_, first, second) = start_game(store).await;
    for bad in ["Z9", "a1", " A1", "A4", ""] {
        assert!(matches!(
            rejection(store.apply_move(&first, bad).await),
            GameRejection::IllegalMove(_)
        ));
    }

    store.apply_move(&first, "B2").await.unwrap();
    assert!(matches!(
        rejection(store.apply_move(&second, "B2").await),
        GameRejection::IllegalMove(_)
    ));
    // The failed attempt kept the turn with the second player.
    store.apply_move(&second, "C3").await.unwrap();
}

/// Rejections on a waiting game must not touch it; the lobby exposes its
/// `updated_at` as `waiting_since`.
pub async fn rejections_leave_open_game_untouched(store: &dyn GameStore) {
    let created = store.create_game(&user("alice")).await.unwrap();

    assert_eq!(
        rejection(store.apply_move(&user("alice"), "A1").await),
        GameRejection::NotYourTurn
    );
    assert_eq!(
        rejection(store.apply_move(&user("alice"), "Q7").await),
        GameRejection::NotYourTurn
    );

    let lobby = store.list_open_games(&user("bob")).await.unwrap();
    let entry = lobby.iter().find(|e| e.game_id == created.id).unwrap();
    assert_eq!(entry.waiting_since, created.updated_at);

    let joined = store.join_game(&user("bob"), &created.id).await.unwrap();
    assert_eq!(joined.board.marked_count(), 0);
}

/// N simultaneous moves on the same cell by the turn holder: one lands.
pub async fn concurrent_moves_accept_exactly_one(store: Arc<dyn GameStore>, n: usize) {
    let (before, first, _) = start_game(store.as_ref()).await;

    let tasks: Vec<_> = (0..n)
        .map(|_| {
            let store = Arc::clone(&store);
            let first = first.clone();
            tokio::spawn(async move { store.apply_move(&first, "B2").await })
        })
        .collect();
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let accepted: Vec<&GameSnapshot> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(accepted.len(), 1, "exactly one move must land");
    for result in &results {
        if let Err(e) = result {
            assert!(e.rejection().is_some(), "unexpected failure: {e}");
        }
    }

    let after = accepted[0];
    assert_eq!(after.board.marked_count(), before.board.marked_count() + 1);
}

/// Concurrent joins of one game by distinct users: one seat, one winner.
pub async fn concurrent_joins_seat_exactly_one(store: Arc<dyn GameStore>, n: usize) {
    let created = store.create_game(&user("host")).await.unwrap();

    let tasks: Vec<_> = (0..n)
        .map(|i| {
            let store = Arc::clone(&store);
            let game_id = created.id.clone();
            tokio::spawn(async move { store.join_game(&user(&format!("guest{i}")), &game_id).await })
        })
        .collect();
    let results = futures::future::join_all(tasks).await;

    let seated: HashSet<UserId> = results
        .into_iter()
        .filter_map(|joined| joined.unwrap().ok())
        .filter_map(|snap| snap.player_o)
        .collect();
    assert_eq!(seated.len(), 1);
}

/// Over many joins the host opens roughly half the time.
pub async fn first_mover_coin_is_fair(store: &dyn GameStore, games: usize) {
    let mut host_first = 0;
    for _ in 0..games {
        let (snap, first, _) = start_game(store).await;
        assert!(first == snap.player_x || Some(&first) == snap.player_o.as_ref());
        if first == user("alice") {
            host_first += 1;
        }
    }
    // Six standard deviations either side of games / 2.
    let spread = 3 * (games as f64).sqrt() as usize;
    let half = games / 2;
    assert!(
        host_first + spread >= half && host_first <= half + spread,
        "host moved first in {host_first} of {games} games"
    );
}

/// Stores never share state: a game in one is unknown to the other.
pub async fn stores_are_isolated(a: &dyn GameStore, b: &dyn GameStore) {
    let game = a.create_game(&user("alice")).await.unwrap();
    assert_eq!(
        rejection(b.join_game(&user("bob"), &game.id).await),
        GameRejection::GameNotFound(game.id.clone())
    );
    assert!(b.list_open_games(&user("bob")).await.unwrap().is_empty());
}
