use super::CommandResult;
use colored::*;
use seat_compare::data::VoteDataSource;
use seat_compare::database::VotesDatabase;
use seat_compare::session::readable_election_name;

pub async fn elections(db: &VotesDatabase) -> CommandResult<()> {
    let elections = db.list_elections().await?;
    if elections.is_empty() {
        println!("{}", "No elections imported yet.".yellow());
        return Ok(());
    }

    println!("🗳️  {} elections", elections.len().to_string().bright_yellow());
    for election in &elections {
        let readable = readable_election_name(election);
        if readable == *election {
            println!("  {}", election.bright_cyan());
        } else {
            println!("  {} ({})", election.bright_cyan(), readable);
        }
    }
    Ok(())
}

pub async fn regions(db: &VotesDatabase, election: &str) -> CommandResult<()> {
    let regions = db.list_regions(election).await?;
    println!(
        "📍 {} regions in {}",
        regions.len().to_string().bright_yellow(),
        readable_election_name(election).bright_cyan()
    );
    for region in &regions {
        println!("  {}", region);
    }
    Ok(())
}
