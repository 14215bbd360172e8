use anyhow::Result;

use round_robin::CyclicQueue;

const TASKS: [&str; 3] = ["Process emails", "Check logs", "Update database"];

pub fn run(rounds: usize) -> Result<()> {
    let mut tasks: CyclicQueue<String> = TASKS.iter().map(|t| t.to_string()).collect();

    println!("Processing tasks in round-robin fashion:");
    for round in 1..=rounds {
        println!("\nRound {}:", round);
        for _ in 0..tasks.len() {
            println!("  Processing task: {}", tasks.try_fetch()?);
        }
    }

    println!("\nAdding new task 'Backup files'");
    tasks.add("Backup files".to_string());

    println!("Processing with dynamic task list:");
    for _ in 0..tasks.len() {
        let task = tasks.try_fetch()?;
        println!("  Current task: {}", task);

        if task == "Check logs" {
            println!("  Removing 'Check logs' task");
            tasks.remove_current()?;
        }
    }

    println!("\nFinishing {} remaining tasks:", tasks.len());
    while tasks.fetch().is_some() {
        let task = tasks.take_current()?;
        println!("  Finished: {}", task);
    }

    debug!("Queue drained: {:?}", tasks);

    Ok(())
}
