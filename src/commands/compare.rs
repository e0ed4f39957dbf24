use super::CommandResult;
use colored::*;
use seat_compare::comparison::{seat_differences, ComparisonReport, ElectionReport};
use seat_compare::data::{CachedVoteData, VoteDataSource};
use seat_compare::database::{DatabaseError, VotesDatabase};
use seat_compare::elections::{
    self, majority_threshold, Election, FirstPastThePost, ProportionalRepresentation,
    SeatAllocator,
};
use seat_compare::session::{readable_election_name, AnalysisOptions, Session};

/// Run one election under both systems and print them side by side.
///
/// Returns whether both systems produced a result.
pub async fn compare(
    db: &VotesDatabase,
    election: Option<&str>,
    offset: i64,
    options: AnalysisOptions,
    json: bool,
) -> CommandResult<bool> {
    let source = CachedVoteData::new(db);

    let mut session =
        Session::new(source.list_elections().await?).ok_or("No elections imported yet")?;
    if let Some(election) = election {
        if !session.select(election) {
            return Err(DatabaseError::NotFound(election.to_string()).into());
        }
    }
    session.navigate(offset);
    let election = session.current().to_string();

    let fptp = calculate(
        &source,
        &election,
        FirstPastThePost,
        options.maximum_coalition_size,
    )
    .await;
    let pr = calculate(
        &source,
        &election,
        ProportionalRepresentation::new(options.pr_method, options.ignore_other),
        options.maximum_coalition_size,
    )
    .await;

    if json {
        return match (fptp, pr) {
            (Ok(fptp), Ok(pr)) => {
                let report = ComparisonReport::new(fptp, pr);
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(true)
            }
            (Err(e), _) | (_, Err(e)) => Err(e.into()),
        };
    }

    println!(
        "\n{} {}",
        "🗳️ ".bright_cyan(),
        readable_election_name(&election).bright_cyan().bold()
    );
    let navigation = match (session.has_previous(), session.has_next()) {
        (true, true) => "earlier and later elections available",
        (true, false) => "most recent election; earlier elections available",
        (false, true) => "earliest election; later elections available",
        (false, false) => "only election",
    };
    println!("{}", navigation.dimmed());

    let mut succeeded = true;
    for (title, report) in [("First Past The Post", &fptp), (pr_title(&options), &pr)] {
        match report {
            Ok(report) => print_report(report),
            Err(e) => {
                succeeded = false;
                println!("\n{}", title.bright_white().bold());
                eprintln!("  ❌ {}", e.to_string().red());
            }
        }
    }

    if let (Ok(fptp), Ok(pr)) = (&fptp, &pr) {
        print_differences(fptp, pr);
    }

    Ok(succeeded)
}

fn pr_title(options: &AnalysisOptions) -> &'static str {
    match options.pr_method {
        elections::PrMethod::ByRegion => "Proportional Representation (By Region)",
        elections::PrMethod::EntireElectorate => "Proportional Representation (Entire Electorate)",
    }
}

async fn calculate<S: VoteDataSource, A: SeatAllocator>(
    source: &S,
    election: &str,
    allocator: A,
    maximum_coalition_size: usize,
) -> elections::Result<ElectionReport> {
    let mut election = Election::new(election, source, allocator, maximum_coalition_size);
    election.calculate_all().await?;
    ElectionReport::from_election(&election)
}

fn print_report(report: &ElectionReport) {
    println!("\n{}", report.election_type.bright_white().bold());
    println!("{}", "=".repeat(50).bright_white());

    for (party, seats) in report.results.iter() {
        let bar = "█".repeat(bar_width(seats, report.total_seats));
        println!(
            "  {:<30} {:>5}  {}",
            party,
            seats.to_string().bright_yellow(),
            bar.bright_blue()
        );
    }
    println!(
        "  {:<30} {:>5}",
        "Total".bold(),
        report.total_seats.to_string().bold()
    );

    let threshold = majority_threshold(report.total_seats);
    if let Some(winner) = &report.outright_winner {
        println!(
            "\n  🏆 {} wins outright ({} seats needed)",
            winner.bright_green().bold(),
            threshold
        );
    } else if report.coalitions.is_empty() {
        println!(
            "\n  {} No coalition of up to {} parties reaches {} seats",
            "⚠️ ".yellow(),
            report.maximum_coalition_size,
            threshold
        );
    } else {
        println!(
            "\n  🤝 {} possible coalitions ({} seats needed)",
            report.coalitions.len().to_string().bright_yellow(),
            threshold
        );
        for coalition in &report.coalitions {
            let seats: u32 = coalition
                .iter()
                .filter_map(|party| report.results.get(party))
                .sum();
            println!("    {} ({})", coalition.join(" + ").bright_green(), seats);
        }
    }
}

fn print_differences(fptp: &ElectionReport, pr: &ElectionReport) {
    let differences = seat_differences(&fptp.results, &pr.results);

    println!("\n{}", "Seat changes under PR".bright_white().bold());
    println!("{}", "=".repeat(50).bright_white());
    if differences.is_empty() {
        println!("  {}", "No party changes seat count".dimmed());
        return;
    }
    for (party, difference) in differences {
        let change = format!("{:+}", difference);
        let change = if difference > 0 {
            change.bright_green()
        } else {
            change.bright_red()
        };
        println!("  {:<30} {:>6}", party, change);
    }
}

fn bar_width(seats: u32, total_seats: u32) -> usize {
    if total_seats == 0 {
        return 0;
    }
    (seats as usize * 40 + total_seats as usize - 1) / total_seats as usize
}
