use std::io::Cursor;

use tabq::{
    GameKind, Player, Result,
    pipeline::{Channels, ConsoleObserver, LogFileObserver, MetricsObserver, Session, SessionConfig},
    ports::Learner,
    q_learning::{QTable, SelfPlayTrainer, TrainingBudget, QLearningAgent},
    strategies::{DefaultLearner, FrozenLearner, ManualLearner, MinimaxLearner, RandomLearner},
};
use tempfile::tempdir;

#[test]
fn test_minimax_never_loses_tic_tac_toe() -> Result<()> {
    for (minimax_seat, seed) in [(Player::One, 11), (Player::Two, 12)] {
        let mut minimax = MinimaxLearner::new("minimax_ab", None, true);
        let mut random = RandomLearner::new("random");
        let mut session = Session::new(SessionConfig::new("safety", 15).with_seed(Some(seed)));

        let summary = match minimax_seat {
            Player::One => session.run(GameKind::TicTacToe, &mut minimax, &mut random)?,
            Player::Two => session.run(GameKind::TicTacToe, &mut random, &mut minimax)?,
        };
        assert_eq!(summary.player(minimax_seat.opponent()).won, 0);
    }
    Ok(())
}

#[test]
fn test_default_blocks_more_than_random() -> Result<()> {
    let mut default_wins = 0;
    let mut random_wins = 0;
    for seed in 0..3 {
        let mut session = Session::new(SessionConfig::new("blocking", 40).with_seed(Some(seed)));
        let mut default = DefaultLearner::new("default");
        let mut random = RandomLearner::new("random");
        let summary = session.run(GameKind::TicTacToe, &mut default, &mut random)?;
        default_wins += summary.player(Player::One).won;
        random_wins += summary.player(Player::Two).won;
    }
    assert!(default_wins > random_wins);
    Ok(())
}

#[test]
fn test_manual_player_through_a_session() -> Result<()> {
    // X tries the left column against a random O
    let input = Cursor::new(b"0 0\n1 0\n2 0\n".to_vec());
    let mut human = ManualLearner::new("manual", input, Vec::new());
    let mut random = RandomLearner::new("random");
    let mut session = Session::new(SessionConfig::new("manual", 1).with_seed(Some(1)));

    let result = session.run(GameKind::TicTacToe, &mut human, &mut random);
    match result {
        // either the game finished on the scripted moves or the script ran out
        Ok(summary) => assert_eq!(summary.num_games, 1),
        Err(tabq::Error::InputClosed) => {}
        Err(other) => return Err(other),
    }
    let prompts = String::from_utf8(human.into_output()).unwrap();
    assert!(prompts.contains("Enter row and column separated by a space: "));
    Ok(())
}

#[test]
fn test_trained_table_plays_legal_games_against_default() -> Result<()> {
    let mut trainer =
        SelfPlayTrainer::new(GameKind::Connect4, QTable::new(0.5, 0.9, 0.0)).with_seed(3);
    trainer.train_both_seats(TrainingBudget::episodes(30))?;

    let agent = QLearningAgent::for_evaluation(trainer.into_table()).with_name("qtab");
    let mut qtab = FrozenLearner::new(Box::new(agent));
    let mut default = DefaultLearner::new("default");
    let size_before = qtab
        .inner()
        .as_any()
        .downcast_ref::<QLearningAgent>()
        .map(|agent| agent.q_table().size());

    let mut metrics = Session::new(SessionConfig::new("qtab_vs_default", 5).with_seed(Some(4)))
        .with_observer(Box::new(MetricsObserver::new()));
    let summary = metrics.run(GameKind::Connect4, &mut default, &mut qtab)?;
    assert_eq!(summary.num_games, 5);

    // frozen: evaluation games do not touch the table
    let size_after = qtab
        .inner()
        .as_any()
        .downcast_ref::<QLearningAgent>()
        .map(|agent| agent.q_table().size());
    assert_eq!(size_before, size_after);
    assert!(size_after.is_some());
    Ok(())
}

#[test]
fn test_console_and_log_output_for_one_game() -> Result<()> {
    let tmp = tempdir().unwrap();
    let mut session = Session::new(SessionConfig::new("watch", 1).with_seed(Some(8)))
        .with_observer(Box::new(LogFileObserver::new(tmp.path(), Channels::all())));
    let mut p1 = DefaultLearner::new("default");
    let mut p2 = RandomLearner::new("random");
    let summary = session.run(GameKind::Connect4, &mut p1, &mut p2)?;

    let logs: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(logs.len(), 1);
    let name = logs[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("con4_watch_"));
    assert!(name.ends_with(&format!("{}.log", summary.session_timestamp)));

    let text = std::fs::read_to_string(&logs[0]).unwrap();
    assert!(text.contains("Playing Session (World 'con4', Session 'watch')"));
    assert!(text.contains("Metrics (World 'con4', Session 'watch', Game '1'):"));
    assert!(text.contains("Metrics (World 'con4', Session 'watch'):"));
    assert!(text.contains("\"num_draws\""));
    assert!(text.contains("\"R\""));
    Ok(())
}

#[test]
fn test_console_observer_prints_boards() -> Result<()> {
    let console = ConsoleObserver::new(Channels::game_play(), Vec::new());
    let mut session = Session::new(SessionConfig::new("boards", 1).with_seed(Some(2)))
        .with_observer(Box::new(console));
    let mut p1 = RandomLearner::new("random");
    let mut p2 = RandomLearner::new("random");
    let summary = session.run(GameKind::TicTacToe, &mut p1, &mut p2)?;
    assert_eq!(summary.num_games, 1);
    let moves = summary.player(Player::One).num_moves + summary.player(Player::Two).num_moves;
    assert!((5..=9).contains(&moves));
    Ok(())
}

#[test]
fn test_learning_agent_improves_its_table_during_a_session() -> Result<()> {
    let mut agent = QLearningAgent::new(0.5, 0.9, 0.3, 1.0, 0.3, 0.0).with_seed(5);
    let mut random = RandomLearner::new("random");
    let mut session = Session::new(SessionConfig::new("online", 10).with_seed(Some(6)));
    session.run(GameKind::TicTacToe, &mut agent, &mut random)?;
    assert!(agent.q_table().size() > 0);
    assert_eq!(agent.name(), "qtab");
    Ok(())
}
