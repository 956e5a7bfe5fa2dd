//! League Night Example
//!
//! Runs a six-player single-elimination night end to end on the in-memory
//! backend: enter players, shuffle seeds, start, and enter every result.

use pool_league::db::MemoryRepository;
use pool_league::tournament::{
    Frame, MatchStatus, TournamentConfig, TournamentFormat, TournamentManager,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== League Night Example ===\n");

    let manager = TournamentManager::with_repository(Arc::new(MemoryRepository::new()));
    let config = TournamentConfig::new("Friday 9-Ball", TournamentFormat::SingleElimination)
        .with_race_to(3);
    let tournament = manager.create_tournament(&config).await?;

    for player_id in 1..=6 {
        manager.add_participant(tournament.id, player_id, None).await?;
    }
    for p in manager.shuffle_seeds(tournament.id).await? {
        println!("Seed {:?}: participant {}", p.seed, p.id);
    }

    manager
        .start_seeded(tournament.id, TournamentFormat::SingleElimination)
        .await?;

    // Slot one always wins 3-1, round by round
    for view in manager.bracket_view(tournament.id).await? {
        println!("\n{}", view.name);
        let matches = manager.list_matches(tournament.id).await?;
        for m in matches.iter().filter(|m| m.round == view.round) {
            let Some((p1, p2)) = m.entrants() else {
                println!("  Match {}: {:?} advances on a bye", m.match_number, m.winner_id);
                continue;
            };
            if m.status == MatchStatus::Completed {
                continue;
            }
            let frames: Vec<Frame> = [p2, p1, p1, p1]
                .into_iter()
                .enumerate()
                .map(|(i, winner_participant_id)| Frame {
                    frame_number: i as u32 + 1,
                    winner_participant_id,
                })
                .collect();
            let outcome = manager
                .submit_match_frames(tournament.id, m.id, &frames)
                .await?;
            println!(
                "  Match {}: {p1} vs {p2} -> {}-{}, winner {:?}",
                m.match_number, outcome.score1, outcome.score2, outcome.winner_id
            );
        }
    }

    let finished = manager.get_tournament(tournament.id).await?;
    println!("\nTournament status: {}", finished.status);
    Ok(())
}
