use std::path::Path;

use tabq::{
    BoardState, GameKind, Result,
    ports::Learner,
    q_learning::{
        QTable, QTableFileName, SavedQTable, SelfPlayTrainer, TrainingBudget, TrainingMetadata,
    },
    strategies::StrategySpec,
};
use tempfile::tempdir;

fn trained(game: GameKind) -> Result<QTable> {
    let mut trainer = SelfPlayTrainer::new(game, QTable::new(0.5, 0.9, 0.0)).with_seed(21);
    trainer.train_both_seats(TrainingBudget::episodes(40))?;
    Ok(trainer.into_table())
}

#[test]
fn test_json_and_msgpack_hold_the_same_table() -> Result<()> {
    let tmp = tempdir().unwrap();
    let table = trained(GameKind::TicTacToe)?;
    let saved = SavedQTable::from_table(GameKind::TicTacToe, &table, TrainingMetadata::default());

    let json = tmp.path().join("t.json");
    let msgpack = tmp.path().join("t.mpk");
    saved.save_to_file(&json)?;
    saved.save_to_file(&msgpack)?;

    let from_json = SavedQTable::load_from_file(&json)?.to_table()?;
    let from_msgpack = SavedQTable::load_from_file(&msgpack)?.to_table()?;
    assert_eq!(from_json.entries(), table.entries());
    assert_eq!(from_msgpack.entries(), table.entries());
    Ok(())
}

#[test]
fn test_json_layout() -> Result<()> {
    let tmp = tempdir().unwrap();
    let mut table = QTable::new(0.5, 0.9, 0.0);
    let key = BoardState::new(GameKind::TicTacToe).canonical_context().key;
    table.set(&key, 4, 0.75);
    let path = tmp.path().join("layout.json");
    SavedQTable::from_table(GameKind::TicTacToe, &table, TrainingMetadata::default())
        .save_to_file(&path)?;

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap())?;
    assert_eq!(value["version"], 1);
    assert_eq!(value["game"], "ttt");
    assert_eq!(value["table"]["ttt:.../.../..."]["4"], 0.75);
    assert!(value["metadata"].is_object());
    Ok(())
}

#[test]
fn test_saved_table_builds_a_player() -> Result<()> {
    let tmp = tempdir().unwrap();
    let table = trained(GameKind::Connect4)?;
    let name = QTableFileName {
        datetime: "20240101000000".to_string(),
        game: GameKind::Connect4,
        alpha: 0.5,
        gamma: 0.9,
        episodes: 80,
        minutes: 0,
    };
    let path = tmp.path().join(name.with_extension("json"));
    SavedQTable::from_table(GameKind::Connect4, &table, TrainingMetadata::default())
        .save_to_file(&path)?;

    let spec: StrategySpec = format!("qtable:{}", path.display()).parse()?;
    let mut player = spec.build(GameKind::Connect4, Some(3))?;
    assert_eq!(player.name(), "qtab");
    let board = BoardState::new(GameKind::Connect4);
    assert!(board.is_legal(player.select_move(&board)?));

    assert!(matches!(
        spec.build(GameKind::TicTacToe, None),
        Err(tabq::Error::GameMismatch { .. })
    ));
    assert_eq!(
        QTableFileName::previous_minutes(Path::new(&path)),
        Some(0)
    );
    Ok(())
}
