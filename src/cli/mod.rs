use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use colored::*;
use tokio::io::AsyncBufReadExt;
use tokio::sync::Mutex;

use crate::ai::{get_motivation, AnalysisContext, GeminiClient, ImagePayload};
use crate::config::Config;
use crate::core::room::{Priority, SubTask, MAX_TASK_MINUTES};
use crate::core::settings::{EncouragementLevel, Theme};
use crate::core::{
    CleaningTask, FileStorage, FocusSummary, NewRoom, NewTask, Personality, PhotoType, Room,
    RoomType, RoomUpdate, Store, ToggleOutcome, COLLECTIBLES,
};
use crate::timers;

pub use commands::{
    ApiKeyCommands, Args, Commands, MascotCommands, RoomCommands, SettingsCommands,
    SubtaskCommands, TaskCommands,
};

mod commands;

pub async fn run(args: Args) -> Result<()> {
    let data_dir = args.data_dir;
    match args.command {
        Commands::Onboard { name } => handle_onboard(data_dir, &name),
        Commands::Profile { name } => handle_profile(data_dir, name),
        Commands::Room { command } => handle_room(data_dir, command).await,
        Commands::Task { command } => handle_task(data_dir, command).await,
        Commands::Subtask { command } => handle_subtask(data_dir, command),
        Commands::Stats => handle_stats(data_dir),
        Commands::Badges => handle_badges(data_dir),
        Commands::Mascot { command } => handle_mascot(data_dir, command),
        Commands::Focus { minutes, room } => handle_focus(data_dir, minutes, room).await,
        Commands::Collection => handle_collection(data_dir),
        Commands::Settings { command } => handle_settings(data_dir, command),
        Commands::Apikey { command } => handle_apikey(data_dir, command),
        Commands::Motivate { context } => handle_motivate(data_dir, context).await,
        Commands::Reset { yes } => handle_reset(data_dir, yes),
    }
}

/// Load config and state, then catch up on streak and mascot decay
fn open(data_dir: Option<PathBuf>) -> Result<(Config, Store)> {
    let config = Config::new(data_dir)?;
    let storage = FileStorage::new(config.storage_dir()).context("Failed to open storage")?;
    let mut store = Store::load(Box::new(storage));
    store.refresh_streak(Utc::now());
    store.update_mascot_status();
    Ok((config, store))
}

fn ai_client(config: &Config, store: &Store) -> Option<GeminiClient> {
    let ai = config.ai_config_with_key(store.api_key());
    match GeminiClient::new(ai) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("Could not build AI client: {}", e);
            None
        }
    }
}

// ===== Profile =====

fn handle_onboard(data_dir: Option<PathBuf>, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Please tell me your name");
    }
    let (_, mut store) = open(data_dir)?;
    let profile = store.complete_onboarding(name.trim());

    println!("{}", format!("👋 Welcome, {}!", profile.name).cyan().bold());
    println!("Let's make your space feel lighter, one small step at a time.");
    println!();
    println!("Next steps:");
    println!("  {} add a room", "declutter room add \"Bedroom\" --type bedroom".green());
    println!("  {} let the AI plan it", "declutter room analyze 1 photo.jpg".green());
    println!("  {} adopt a buddy", "declutter mascot adopt Dusty".green());
    Ok(())
}

fn handle_profile(data_dir: Option<PathBuf>, name: Option<String>) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    if let Some(name) = name {
        let profile = store.update_profile_name(&name)?;
        println!("✅ Name updated to {}", profile.name.bold());
        return Ok(());
    }

    match store.state().user.as_ref() {
        Some(profile) => {
            println!("{}", "👤 Profile".cyan().bold());
            println!("  Name: {}", profile.name);
            println!("  Since: {}", profile.created_at.format("%Y-%m-%d"));
            println!(
                "  Onboarding: {}",
                if profile.onboarding_complete { "done" } else { "not finished" }
            );
        }
        None => println!("No profile yet. Run {} to get started.", "declutter onboard <name>".green()),
    }
    Ok(())
}

// ===== Rooms =====

async fn handle_room(data_dir: Option<PathBuf>, command: RoomCommands) -> Result<()> {
    let (config, mut store) = open(data_dir)?;

    match command {
        RoomCommands::Add { name, room_type, emoji } => {
            let room_type: RoomType = room_type.parse().map_err(|e: String| anyhow!(e))?;
            let room = store.add_room(NewRoom { name, room_type, emoji });
            println!("✅ Added {} {}", room.emoji, room.name.bold());
        }
        RoomCommands::List => {
            if store.rooms().is_empty() {
                println!("No rooms yet. Add one with {}", "declutter room add <name>".green());
                return Ok(());
            }
            println!("{} ({}% overall)", "🏠 Rooms".cyan().bold(), store.total_progress());
            for (i, room) in store.rooms().iter().enumerate() {
                println!(
                    "  {}. {} {} {} {}% ({}/{} tasks, mess {})",
                    i + 1,
                    room.emoji,
                    room.name.bold(),
                    progress_bar(room.current_progress),
                    room.current_progress,
                    room.completed_count(),
                    room.tasks.len(),
                    room.mess_level
                );
            }
        }
        RoomCommands::Show { room } => {
            let room_id = resolve_room(&store, &room)?;
            if let Some(room) = store.room(&room_id) {
                print_room(room);
            }
        }
        RoomCommands::Delete { room } => {
            let room_id = resolve_room(&store, &room)?;
            let room = store.delete_room(&room_id)?;
            println!("🗑️  Deleted {} {}", room.emoji, room.name);
        }
        RoomCommands::Photo { room, path, kind } => {
            let room_id = resolve_room(&store, &room)?;
            let photo_type: PhotoType = kind.parse().map_err(|e: String| anyhow!(e))?;
            let photo = store.add_photo(&room_id, &path.display().to_string(), photo_type)?;
            println!("📸 Saved {:?} photo {}", photo.photo_type, photo.uri);
        }
        RoomCommands::Analyze { room, photo, notes, minutes } => {
            let room_id = resolve_room(&store, &room)?;
            handle_analyze(&config, &mut store, &room_id, &photo, notes, minutes).await?;
        }
        RoomCommands::Compare { room, before, after } => {
            let room_id = resolve_room(&store, &room)?;
            handle_compare(&config, &mut store, &room_id, &before, &after).await?;
        }
    }
    Ok(())
}

async fn handle_analyze(
    config: &Config,
    store: &mut Store,
    room_id: &str,
    photo: &Path,
    notes: Option<String>,
    minutes: Option<u32>,
) -> Result<()> {
    let client = ai_client(config, store)
        .filter(|c| c.config().has_api_key())
        .ok_or_else(|| anyhow!("No API key. Set one with `declutter apikey set <key>` or GEMINI_API_KEY"))?;

    let image = ImagePayload::from_path(photo)
        .await
        .with_context(|| format!("Failed to read photo {}", photo.display()))?;
    store.add_photo(room_id, &photo.display().to_string(), PhotoType::Before)?;

    let context = match store.room(room_id) {
        Some(room) => AnalysisContext {
            room_name: Some(room.name.clone()),
            room_type: Some(room.room_type),
            notes,
            available_minutes: minutes,
        },
        None => AnalysisContext::default(),
    };

    println!("{}", "🔍 Looking at your photo...".cyan());
    let analysis = match client.analyze_room(&image, &context).await {
        Ok(analysis) => analysis,
        Err(e) => {
            if e.is_retryable() {
                println!("{}", "You can run the same command again to retry.".yellow());
            }
            return Err(e).context("Analysis failed");
        }
    };

    let room = store.apply_analysis(room_id, &analysis)?;
    if analysis.used_fallback {
        println!("{}", "(Couldn't read the details, so here's a starter plan.)".yellow());
    }
    println!("{} {}", "Mess level:".bold(), mess_label(analysis.mess_level));
    println!("{}", analysis.summary);
    println!("💬 {}", analysis.encouragement.italic());
    if !analysis.quick_wins.is_empty() {
        println!("{}", "⚡ Quick wins".green().bold());
        for win in &analysis.quick_wins {
            println!("  • {}", win);
        }
    }
    println!("⏱️  About {} minutes in total", analysis.estimated_total_minutes);
    println!();
    print_room(&room);
    Ok(())
}

async fn handle_compare(
    config: &Config,
    store: &mut Store,
    room_id: &str,
    before: &Path,
    after: &Path,
) -> Result<()> {
    let client = ai_client(config, store)
        .filter(|c| c.config().has_api_key())
        .ok_or_else(|| anyhow!("No API key. Set one with `declutter apikey set <key>` or GEMINI_API_KEY"))?;

    let before_image = ImagePayload::from_path(before)
        .await
        .with_context(|| format!("Failed to read photo {}", before.display()))?;
    let after_image = ImagePayload::from_path(after)
        .await
        .with_context(|| format!("Failed to read photo {}", after.display()))?;
    store.add_photo(room_id, &after.display().to_string(), PhotoType::After)?;

    let context = AnalysisContext {
        room_name: store.room(room_id).map(|r| r.name.clone()),
        ..AnalysisContext::default()
    };

    println!("{}", "🔍 Comparing photos...".cyan());
    let comparison = client
        .compare_progress(&before_image, &after_image, &context)
        .await
        .context("Comparison failed")?;

    if let Some(level) = comparison.mess_level_after {
        store.update_room(
            room_id,
            RoomUpdate {
                mess_level: Some(level as i64),
                ..RoomUpdate::default()
            },
        )?;
    }

    println!(
        "{} {} {}%",
        "📈 Progress:".bold(),
        progress_bar(comparison.progress_percentage),
        comparison.progress_percentage
    );
    for item in &comparison.improvements {
        println!("  {} {}", "✔".green(), item);
    }
    for item in &comparison.remaining_issues {
        println!("  {} {}", "•".yellow(), item);
    }
    println!("🎉 {}", comparison.encouragement);
    Ok(())
}

// ===== Tasks =====

async fn handle_task(data_dir: Option<PathBuf>, command: TaskCommands) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    match command {
        TaskCommands::Add { room, title, minutes, priority, description, steps } => {
            let room_id = resolve_room(&store, &room)?;
            let mut task = NewTask::simple(title, minutes.clamp(1, MAX_TASK_MINUTES));
            if let Some(priority) = priority {
                task.priority = Priority::parse_lenient(&priority);
            }
            task.description = description.unwrap_or_default();
            task.sub_tasks = steps;
            let task = store.add_task(&room_id, task)?;
            println!("✅ Added {} {} ({} min)", task.emoji, task.title.bold(), task.estimated_minutes);
        }
        TaskCommands::Toggle { room, task } => {
            let room_id = resolve_room(&store, &room)?;
            let task_id = resolve_task(room_of(&store, &room_id)?, &task)?;
            let outcome = store.toggle_task(&room_id, &task_id)?;
            print_toggle_outcome(&store, &outcome);
            if let Some(spawn) = outcome.spawn {
                offer_collectible(&mut store, &spawn.id).await?;
            }
        }
        TaskCommands::Delete { room, task } => {
            let room_id = resolve_room(&store, &room)?;
            let task_id = resolve_task(room_of(&store, &room_id)?, &task)?;
            let task = store.delete_task(&room_id, &task_id)?;
            println!("🗑️  Removed {}", task.title);
        }
        TaskCommands::QuickWins { room } => {
            let room_id = resolve_room(&store, &room)?;
            let wins = store.quick_wins(&room_id)?;
            if wins.is_empty() {
                println!("No quick wins left in this room. Nice work!");
            } else {
                println!("{}", "⚡ Quick wins (2 minutes or less)".green().bold());
                for task in wins {
                    println!("  {} {}", task.emoji, task.title);
                }
            }
        }
    }
    Ok(())
}

fn handle_subtask(data_dir: Option<PathBuf>, command: SubtaskCommands) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    match command {
        SubtaskCommands::Toggle { room, task, subtask } => {
            let room_id = resolve_room(&store, &room)?;
            let room = room_of(&store, &room_id)?;
            let task_id = resolve_task(room, &task)?;
            let sub_task_id = match room.task(&task_id) {
                Some(task) => resolve_subtask(task, &subtask)?,
                None => bail!("Task not found: {}", task),
            };
            let done = store.toggle_sub_task(&room_id, &task_id, &sub_task_id)?;
            println!("{} step", if done { "✅ Checked" } else { "↩️  Unchecked" });
        }
    }
    Ok(())
}

fn print_toggle_outcome(store: &Store, outcome: &ToggleOutcome) {
    if !outcome.completed {
        println!("↩️  Marked as not done ({}% of the room)", outcome.progress);
        return;
    }

    println!(
        "{} +{} XP  {} {}%",
        "🎉 Done!".green().bold(),
        outcome.xp_gained,
        progress_bar(outcome.progress),
        outcome.progress
    );
    if outcome.room_completed {
        println!("{}", "🏆 Room complete! +50 bonus XP".yellow().bold());
    }
    if outcome.level_up {
        println!("{}", format!("⬆️  Level up! You're now level {}", store.stats().level).magenta().bold());
    }
    for badge in &outcome.new_badges {
        println!("{} {} {}", "🏅 Badge unlocked:".cyan().bold(), badge.emoji, badge.name);
    }
    if let Some(mascot) = store.mascot() {
        println!("{} {} enjoyed that snack!", mascot.personality.emoji(), mascot.name);
    }
}

/// Give the user the spawn window to grab a collectible
async fn offer_collectible(store: &mut Store, spawn_id: &str) -> Result<()> {
    let Some(spawn) = store.active_spawn().cloned() else {
        return Ok(());
    };
    if !store.settings().collection.show_spawn_notifications {
        return Ok(());
    }
    let Some(item) = crate::core::collection::find_collectible(&spawn.collectible_id) else {
        return Ok(());
    };

    println!(
        "{} {} {} appeared! Press Enter within 30 seconds to collect it.",
        item.rarity.emoji(),
        item.emoji,
        item.name.bold()
    );

    let window = (spawn.expires_at - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO);
    let mut line = String::new();
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let pressed = matches!(
        tokio::time::timeout(window, stdin.read_line(&mut line)).await,
        Ok(Ok(n)) if n > 0
    );

    if !pressed {
        store.expire_spawn(Utc::now());
        println!("{} wandered off...", item.name);
        return Ok(());
    }

    match store.collect_spawn(spawn_id) {
        Ok(_) => println!(
            "✨ Collected {} {} (+{} XP)",
            item.emoji,
            item.name.bold(),
            item.xp_value
        ),
        Err(e) => println!("{} {}", "Too late:".yellow(), e),
    }
    Ok(())
}

// ===== Stats =====

fn handle_stats(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, store) = open(data_dir)?;
    let stats = store.stats();

    println!("{}", "📊 Your progress".cyan().bold());
    println!(
        "  Level {}  ({} XP, {} to next level)",
        stats.level.to_string().bold(),
        stats.xp,
        (stats.level * crate::core::stats::XP_PER_LEVEL).saturating_sub(stats.xp)
    );
    println!("  🔥 Streak: {} days (best {})", stats.current_streak, stats.longest_streak);
    println!("  ✅ Tasks done: {}", stats.total_tasks_completed);
    println!("  🏠 Rooms cleaned: {}", stats.total_rooms_cleaned);
    println!("  ⏱️  Minutes cleaned: {}", stats.total_minutes_cleaned);
    println!("  🏅 Badges: {}", stats.badges.len());
    println!("  📈 Overall: {} {}%", progress_bar(store.total_progress()), store.total_progress());
    Ok(())
}

fn handle_badges(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, store) = open(data_dir)?;

    println!("{}", "🏅 Badges".cyan().bold());
    for (badge, current) in store.stats().badge_progress() {
        match badge.unlocked_at {
            Some(at) => println!(
                "  {} {} {} - {}",
                badge.emoji,
                badge.name.green().bold(),
                format!("({})", at.format("%Y-%m-%d")).dimmed(),
                badge.description
            ),
            None => println!(
                "  🔒 {} - {} {}",
                badge.name,
                badge.description,
                format!("{}/{}", current.min(badge.requirement), badge.requirement).dimmed()
            ),
        }
    }
    Ok(())
}

// ===== Mascot =====

fn handle_mascot(data_dir: Option<PathBuf>, command: MascotCommands) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    let mascot = match command {
        MascotCommands::Adopt { name, personality } => {
            let personality: Personality = personality.parse().map_err(|e: String| anyhow!(e))?;
            let mascot = store.adopt_mascot(&name, personality);
            println!(
                "🎉 Meet {}! {} {}",
                mascot.name.bold(),
                personality.emoji(),
                personality.description()
            );
            mascot
        }
        MascotCommands::Status => store
            .mascot()
            .cloned()
            .ok_or_else(|| anyhow!("No mascot yet. Adopt one with `declutter mascot adopt <name>`"))?,
        MascotCommands::Feed => {
            let mascot = store.feed_mascot()?;
            println!("🍪 {} munches happily.", mascot.name);
            mascot
        }
        MascotCommands::Pet => {
            let mascot = store.interact_with_mascot()?;
            println!("🤗 {} loved that!", mascot.name);
            mascot
        }
    };

    let now = Utc::now();
    println!(
        "{} {} {} ({}, level {})",
        mascot.personality.emoji(),
        mascot.name.cyan().bold(),
        mascot.mood.emoji(),
        mascot.mood,
        mascot.level
    );
    println!("  Hunger    {} {:.0}", progress_bar(mascot.hunger as u8), mascot.hunger);
    println!("  Energy    {} {:.0}", progress_bar(mascot.energy as u8), mascot.energy);
    println!("  Happiness {} {:.0}", progress_bar(mascot.happiness as u8), mascot.happiness);
    println!("  💬 {}", mascot.greeting(now).italic());
    Ok(())
}

// ===== Focus =====

async fn handle_focus(data_dir: Option<PathBuf>, minutes: Option<u32>, room: Option<String>) -> Result<()> {
    let (config, mut store) = open(data_dir)?;
    let minutes = minutes.unwrap_or(store.settings().focus_mode.default_duration_minutes);
    let room_id = match room {
        Some(room) => Some(resolve_room(&store, &room)?),
        None => None,
    };

    store.start_focus_session(minutes, room_id)?;
    println!(
        "{} {} minutes. Ctrl-C to stop early.",
        "🎯 Focus time!".cyan().bold(),
        minutes
    );

    let store = Arc::new(Mutex::new(store));
    let decay = timers::spawn_mascot_decay(
        store.clone(),
        Duration::from_secs(config.mascot_decay_interval_secs.max(1)),
    );

    let countdown = timers::run_focus_countdown_every(store.clone(), timers::FOCUS_TICK, |session| {
        print!("\r⏱️  {} remaining ", session.remaining_display());
        let _ = std::io::stdout().flush();
    });

    let summary = tokio::select! {
        summary = countdown => summary,
        _ = tokio::signal::ctrl_c() => {
            let mut store = store.lock().await;
            if let Err(e) = store.record_distraction() {
                tracing::debug!("No distraction recorded: {}", e);
            }
            store.end_focus_session().ok()
        }
    };
    decay.abort();
    println!();

    match summary {
        Some(summary) => print_focus_summary(&summary),
        None => println!("Focus session ended."),
    }
    Ok(())
}

fn print_focus_summary(summary: &FocusSummary) {
    if summary.completed {
        println!("{}", "🎉 Session complete!".green().bold());
    } else {
        println!("{}", "⏹️  Session ended early".yellow().bold());
    }
    println!(
        "  Focused {} of {} minutes, +{} XP",
        summary.focused_minutes, summary.duration_minutes, summary.bonus_xp
    );
    if summary.tasks_completed > 0 {
        println!("  Tasks finished during the session: {}", summary.tasks_completed);
    }
}

// ===== Collection =====

fn handle_collection(data_dir: Option<PathBuf>) -> Result<()> {
    let (_, store) = open(data_dir)?;
    let state = store.state();
    let stats = &state.collection_stats;

    println!(
        "{} {}/{} found, {} total, {} XP",
        "🎒 Collection".cyan().bold(),
        stats.unique_collected,
        COLLECTIBLES.len(),
        stats.total_collected,
        stats.collectibles_xp
    );
    for item in COLLECTIBLES {
        let count = state
            .collection
            .iter()
            .filter(|c| c.collectible_id == item.id)
            .count();
        if count > 0 {
            println!(
                "  {} {} {} x{} {}",
                item.rarity.emoji(),
                item.emoji,
                item.name.bold(),
                count,
                item.rarity.name().dimmed()
            );
        } else {
            println!("  {} ❔ ??? {}", item.rarity.emoji(), item.rarity.name().dimmed());
        }
    }
    Ok(())
}

// ===== Settings =====

fn handle_settings(data_dir: Option<PathBuf>, command: SettingsCommands) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    match command {
        SettingsCommands::Show => {
            let json = serde_json::to_string_pretty(store.settings())
                .context("Failed to serialize settings")?;
            println!("{}", json);
        }
        SettingsCommands::Set { key, value } => {
            let mut settings = store.settings().clone();
            match key.as_str() {
                "theme" => settings.theme = value.parse::<Theme>().map_err(|e| anyhow!(e))?,
                "encouragement" => {
                    settings.encouragement_level =
                        value.parse::<EncouragementLevel>().map_err(|e| anyhow!(e))?
                }
                "notifications" => settings.notifications_enabled = parse_bool(&value)?,
                "haptics" => settings.haptic_feedback = parse_bool(&value)?,
                "focus-duration" => {
                    let minutes: u32 = value.parse().context("Expected a number of minutes")?;
                    if minutes == 0 {
                        bail!("Focus duration must be at least one minute");
                    }
                    settings.focus_mode.default_duration_minutes = minutes;
                }
                "strict-mode" => settings.focus_mode.strict_mode = parse_bool(&value)?,
                "break-reminders" => settings.focus_mode.break_reminders = parse_bool(&value)?,
                "collection" => settings.collection.enabled = parse_bool(&value)?,
                "spawn-on-complete" => settings.collection.spawn_on_task_complete = parse_bool(&value)?,
                "spawn-notifications" => {
                    settings.collection.show_spawn_notifications = parse_bool(&value)?
                }
                _ => bail!("Unknown setting: {}", key),
            }
            store.update_settings(settings);
            println!("✅ {} = {}", key, value);
        }
    }
    Ok(())
}

fn handle_apikey(data_dir: Option<PathBuf>, command: ApiKeyCommands) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    match command {
        ApiKeyCommands::Set { key } => {
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            store.set_api_key(Some(key.trim().to_string()));
            println!("🔑 API key saved ({})", mask_key(key.trim()));
        }
        ApiKeyCommands::Clear => {
            store.set_api_key(None);
            println!("🔑 API key removed");
        }
    }
    Ok(())
}

async fn handle_motivate(data_dir: Option<PathBuf>, context: Option<String>) -> Result<()> {
    let (config, store) = open(data_dir)?;
    let client = ai_client(&config, &store);
    let context = context.unwrap_or_else(|| "tidying up at home".to_string());

    let line = get_motivation(client.as_ref(), &context).await;
    println!("💪 {}", line.bold());
    Ok(())
}

fn handle_reset(data_dir: Option<PathBuf>, yes: bool) -> Result<()> {
    let (_, mut store) = open(data_dir)?;

    if !yes {
        print!("This deletes every room, task, badge and your mascot. Type 'yes' to continue: ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if answer.trim() != "yes" {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.reset_all_data();
    println!("🧹 All data cleared. Fresh start!");
    Ok(())
}

// ===== Helpers =====

fn room_of<'a>(store: &'a Store, room_id: &str) -> Result<&'a Room> {
    store
        .room(room_id)
        .ok_or_else(|| anyhow!("Room not found: {}", room_id))
}

/// Room by list number, id, unique id prefix or name
fn resolve_room(store: &Store, query: &str) -> Result<String> {
    let rooms = store.rooms();
    if let Ok(n) = query.parse::<usize>() {
        if let Some(room) = n.checked_sub(1).and_then(|i| rooms.get(i)) {
            return Ok(room.id.clone());
        }
    }
    if let Some(room) = rooms.iter().find(|r| r.id == query || r.name.eq_ignore_ascii_case(query)) {
        return Ok(room.id.clone());
    }
    let matches: Vec<&Room> = rooms.iter().filter(|r| r.id.starts_with(query)).collect();
    match matches.as_slice() {
        [room] => Ok(room.id.clone()),
        [] => bail!("Room not found: {}", query),
        _ => bail!("'{}' matches several rooms, be more specific", query),
    }
}

/// Task by list number, id, unique id prefix or title
fn resolve_task(room: &Room, query: &str) -> Result<String> {
    if let Ok(n) = query.parse::<usize>() {
        if let Some(task) = n.checked_sub(1).and_then(|i| room.tasks.get(i)) {
            return Ok(task.id.clone());
        }
    }
    if let Some(task) = room
        .tasks
        .iter()
        .find(|t| t.id == query || t.title.eq_ignore_ascii_case(query))
    {
        return Ok(task.id.clone());
    }
    let matches: Vec<&CleaningTask> = room.tasks.iter().filter(|t| t.id.starts_with(query)).collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => bail!("Task not found in {}: {}", room.name, query),
        _ => bail!("'{}' matches several tasks, be more specific", query),
    }
}

fn resolve_subtask(task: &CleaningTask, query: &str) -> Result<String> {
    if let Ok(n) = query.parse::<usize>() {
        if let Some(step) = n.checked_sub(1).and_then(|i| task.sub_tasks.get(i)) {
            return Ok(step.id.clone());
        }
    }
    let matches: Vec<&SubTask> = task
        .sub_tasks
        .iter()
        .filter(|s| s.id.starts_with(query))
        .collect();
    match matches.as_slice() {
        [step] => Ok(step.id.clone()),
        _ => bail!("Step not found: {}", query),
    }
}

fn print_room(room: &Room) {
    println!(
        "{} {} {} {}%",
        room.emoji,
        room.name.cyan().bold(),
        progress_bar(room.current_progress),
        room.current_progress
    );
    println!("  Type: {}  Mess: {}", room.room_type, mess_label(room.mess_level));
    if let Some(summary) = &room.ai_summary {
        println!("  {}", summary);
    }
    if let Some(message) = &room.motivational_message {
        println!("  💬 {}", message.italic());
    }
    if room.tasks.is_empty() {
        println!("  No tasks yet.");
        return;
    }
    println!("  {} minutes left", room.remaining_minutes());
    for (i, task) in room.tasks.iter().enumerate() {
        let check = if task.completed { "✅".to_string() } else { "⬜".to_string() };
        let title = if task.completed {
            task.title.dimmed().to_string()
        } else {
            task.title.bold().to_string()
        };
        println!(
            "  {} {:>2}. {} {} ({} min, {}, {})",
            check,
            i + 1,
            task.emoji,
            title,
            task.estimated_minutes,
            task.priority,
            task.difficulty
        );
        for (j, step) in task.sub_tasks.iter().enumerate() {
            println!(
                "        {} {}. {}",
                if step.completed { "☑" } else { "☐" },
                j + 1,
                step.title
            );
        }
    }
}

fn mess_label(level: u8) -> String {
    let label = match level {
        0..=20 => "tidy".green(),
        21..=50 => "a bit messy".yellow(),
        51..=80 => "messy".bright_red(),
        _ => "very messy".red().bold(),
    };
    format!("{} ({})", level, label)
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize + 5) / 10;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(10 - filled))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("Expected on/off, got {}", value),
    }
}

fn mask_key(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("…{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStorage;

    fn store_with_room() -> (Store, String) {
        let mut store = Store::load(Box::new(MemoryStorage::new()));
        let room = store.add_room(NewRoom {
            name: "Kitchen".to_string(),
            room_type: RoomType::Kitchen,
            emoji: None,
        });
        store.add_task(&room.id, NewTask::simple("Wipe counters", 5)).unwrap();
        let mut steps = NewTask::simple("Empty fridge", 15);
        steps.sub_tasks = vec!["Toss old food".to_string(), "Wipe shelves".to_string()];
        store.add_task(&room.id, steps).unwrap();
        (store, room.id)
    }

    #[test]
    fn test_resolve_room() {
        let (store, room_id) = store_with_room();
        assert_eq!(resolve_room(&store, "1").unwrap(), room_id);
        assert_eq!(resolve_room(&store, "kitchen").unwrap(), room_id);
        assert_eq!(resolve_room(&store, &room_id[..8]).unwrap(), room_id);
        assert!(resolve_room(&store, "garage").is_err());
    }

    #[test]
    fn test_resolve_task_and_step() {
        let (store, room_id) = store_with_room();
        let room = store.room(&room_id).unwrap();

        let fridge = resolve_task(room, "2").unwrap();
        assert_eq!(room.task(&fridge).unwrap().title, "Empty fridge");
        assert_eq!(resolve_task(room, "wipe counters").unwrap(), room.tasks[0].id);

        let task = room.task(&fridge).unwrap();
        assert_eq!(resolve_subtask(task, "2").unwrap(), task.sub_tasks[1].id);
        assert!(resolve_subtask(task, "missing").is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "[░░░░░░░░░░]");
        assert_eq!(progress_bar(50), "[█████░░░░░]");
        assert_eq!(progress_bar(100), "[██████████]");
        assert_eq!(progress_bar(250), "[██████████]");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("ON").unwrap());
        assert!(!parse_bool("no").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AIzaSyABCDEF1234"), "…1234");
        assert_eq!(mask_key("ab"), "…ab");
    }
}
