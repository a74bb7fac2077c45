use anyhow::anyhow;
use clap::Parser;
use const_format::concatcp;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::fs::File;
use std::process::{self, Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const LOCAL_PORT: u32 = 8374;
const LOCAL_URL: &str = concatcp!("http://127.0.0.1:", LOCAL_PORT);

#[derive(Parser)]
struct Args {
    /// Silence local server logging.
    #[arg(short, long)]
    quiet: bool,

    /// Send local server logging to this file; takes precedence over --quiet.
    #[arg(long)]
    logfile: Option<String>,

    /// Connect to a remote server at this URL instead of running a local one.
    #[arg(long)]
    remote: Option<String>,

    /// How many threads to use. Defaults to the number of logical CPUs.
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Votes cast by each thread.
    #[arg(long, default_value_t = 200)]
    votes_per_thread: usize,

    /// Probability that a voter tries to vote a second time.
    #[arg(long, default_value_t = 0.05)]
    repeat_rate: f64,

    /// Ask the server to derive each nullifier instead of using the voter ID directly.
    #[arg(long)]
    derive: bool,
}

/// Construct a URL from a base and a path.
macro_rules! url {
    ($base:expr, $path:expr) => {
        format!("{}/{}", $base.trim_end_matches('/'), $path)
    };
}

/// Terminate the given child process. This is a SIGTERM on unix and a hard-kill on other
/// platforms.
fn terminate_child(child: &mut Child) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let pid = nix::unistd::Pid::from_raw(child.id() as i32);
        nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM)?;
    }
    #[cfg(not(unix))]
    {
        child.kill()?;
    }
    Ok(())
}

/// Build and start a local server, waiting until it answers health checks.
fn launch_server(logfile: Stdio) -> anyhow::Result<Child> {
    Command::new("cargo")
        .args(["build", "--release", "--bin", "nullivote-backend"])
        .status()?
        .success()
        .then_some(())
        .ok_or_else(|| anyhow!("server build exited nonzero"))?;

    let mut proc = Command::new("./target/release/nullivote-backend")
        .env("ROCKET_PORT", concatcp!(LOCAL_PORT))
        .env("ROCKET_ADDRESS", "127.0.0.1")
        .stdout(logfile)
        .spawn()?;

    let client = Client::new();
    loop {
        let resp = client
            .get(url!(LOCAL_URL, "health"))
            .send()
            .and_then(Response::error_for_status);
        if resp.is_ok() {
            break;
        }

        // Check the server didn't exit.
        if let Some(retcode) = proc.try_wait()? {
            return Err(anyhow!("Server exited prematurely with code {}", retcode));
        }
        thread::sleep(Duration::from_millis(50));
    }

    Ok(proc)
}

/// Open a fresh proposal to vote on and return its ID.
fn setup_proposal(url: &str) -> anyhow::Result<String> {
    let proposal_id = format!("benchmark-{}", rand::random::<u32>());
    Client::new()
        .post(url!(url, "api/session/create"))
        .json(&json!({ "proposalId": proposal_id }))
        .send()
        .and_then(Response::error_for_status)?;
    Ok(proposal_id)
}

fn nullifier_for(
    url: &str,
    client: &Client,
    voter_id: &str,
    derive: bool,
) -> anyhow::Result<String> {
    if !derive {
        return Ok(voter_id.to_string());
    }

    #[derive(Deserialize)]
    struct Derived {
        nullifier: String,
    }
    let Derived { nullifier } = client
        .post(url!(url, "api/nullifier/generate"))
        .json(&json!({ "voterId": voter_id }))
        .send()
        .and_then(Response::error_for_status)?
        .json()?;
    Ok(nullifier)
}

/// Submit a vote, returning `false` if the server refused it as a repeat vote.
fn submit(
    url: &str,
    client: &Client,
    proposal_id: &str,
    nullifier: &str,
    yes: bool,
) -> anyhow::Result<bool> {
    let resp = client
        .post(url!(url, "api/vote/submit"))
        .json(&json!({
            "proposalId": proposal_id,
            "vote": {
                "nullifier": nullifier,
                "vote": u8::from(yes),
                "proof": "benchmark",
            },
        }))
        .send()?;
    #[derive(Deserialize)]
    struct ErrorBody {
        kind: String,
    }

    match resp.status().as_u16() {
        200 => Ok(true),
        code => {
            let body = resp.text()?;
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { kind }) if code == 400 && kind == "duplicate_nullifier" => {
                    Ok(false)
                }
                _ => Err(anyhow!("Vote rejected with status {code}: {body}")),
            }
        }
    }
}

/// Mean time per submission, without narrowing the count.
fn average_latency(busy: Duration, requests: u64) -> Duration {
    busy.div_f64(requests.max(1) as f64)
}

/// Counts observed by one worker.
#[derive(Debug, Default)]
struct Outcome {
    accepted: u64,
    accepted_yes: u64,
    rejected: u64,
    busy: Duration,
}

/// Run the benchmark, returning the combined outcome.
fn benchmark(url: &str, proposal_id: &str, args: &Args) -> anyhow::Result<(Outcome, Duration)> {
    let start = Instant::now();
    let outcome = thread::scope(|s| {
        let threads = (0..args.threads)
            .map(|t| {
                s.spawn(move || {
                    let client = Client::new();
                    let mut outcome = Outcome::default();
                    for v in 0..args.votes_per_thread {
                        let voter_id = format!("voter-{t}-{v}");
                        let nullifier = nullifier_for(url, &client, &voter_id, args.derive)?;
                        let yes = rand::random::<bool>();

                        let attempts = if rand::random::<f64>() < args.repeat_rate {
                            2
                        } else {
                            1
                        };
                        for _ in 0..attempts {
                            let pre = Instant::now();
                            let accepted = submit(url, &client, proposal_id, &nullifier, yes)?;
                            outcome.busy += pre.elapsed();
                            if accepted {
                                outcome.accepted += 1;
                                outcome.accepted_yes += u64::from(yes);
                            } else {
                                outcome.rejected += 1;
                            }
                        }
                    }
                    Ok::<_, anyhow::Error>(outcome)
                })
            })
            .collect::<Vec<_>>();

        let mut total = Outcome::default();
        for t in threads {
            let outcome = t.join().map_err(|_| anyhow!("worker thread panicked"))??;
            total.accepted += outcome.accepted;
            total.accepted_yes += outcome.accepted_yes;
            total.rejected += outcome.rejected;
            total.busy += outcome.busy;
        }
        Ok::<_, anyhow::Error>(total)
    })?;
    Ok((outcome, start.elapsed()))
}

/// Check the server's tally against what the workers saw.
fn verify(url: &str, proposal_id: &str, outcome: &Outcome) -> anyhow::Result<()> {
    #[derive(Debug, Deserialize)]
    struct Tally {
        yes: u64,
        no: u64,
    }
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Results {
        results: Tally,
        total_votes: u64,
    }

    let results: Results = Client::new()
        .get(url!(url, "api/results"))
        .query(&[("proposalId", proposal_id)])
        .send()
        .and_then(Response::error_for_status)?
        .json()?;

    if results.results.yes + results.results.no != results.total_votes {
        return Err(anyhow!("Inconsistent tally: {:?}", results));
    }
    if results.total_votes != outcome.accepted || results.results.yes != outcome.accepted_yes {
        return Err(anyhow!(
            "Tally {:?} does not match {} accepted votes ({} yes)",
            results,
            outcome.accepted,
            outcome.accepted_yes
        ));
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let url = args.remote.as_deref().unwrap_or(LOCAL_URL);

    // If we're not connecting remotely, bring up a local server.
    let mut proc: Option<Child> = None;
    if args.remote.is_none() {
        let logfile = match args.logfile {
            Some(ref path) => Stdio::from(File::create(path)?),
            None => {
                if args.quiet {
                    Stdio::null()
                } else {
                    Stdio::inherit()
                }
            }
        };
        proc = Some(launch_server(logfile)?);
    }

    // Use a closure to ensure the cleanup below runs.
    let result = (|| {
        let proposal_id = setup_proposal(url)?;
        let (outcome, elapsed) = benchmark(url, &proposal_id, &args)?;
        verify(url, &proposal_id, &outcome)?;

        let requests = outcome.accepted + outcome.rejected;
        let avg = average_latency(outcome.busy, requests);
        println!("accepted: {} ({} yes)", outcome.accepted, outcome.accepted_yes);
        println!("rejected repeats: {}", outcome.rejected);
        println!("avg submit latency: {:?}", avg);
        println!(
            "throughput: {} submissions in {:?} ({:.2}/s)",
            requests,
            elapsed,
            requests as f64 / elapsed.as_secs_f64()
        );
        Ok(())
    })();

    // Kill the server.
    if let Some(p) = proc.as_mut() {
        terminate_child(p)?;
        p.wait()?;
    }

    result
}

fn main() {
    if let Err(e) = run() {
        eprintln!("FATAL: {}", e);
        process::exit(1);
    }
}
