use std::sync::Arc;

use appdata_quiz_bot::app_data::{Profiles, SaveOutcome};
use appdata_quiz_bot::config::Config;
use appdata_quiz_bot::quiz::{Equation, History};
use dotenv::dotenv;
use log::{debug, error, info};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type DialogueStorage = Arc<ErasedStorage<State>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Answering {
        equation: Equation,
        history: History,
    },
}

#[tokio::main]
async fn main() -> HandlerResult {
    let dotenv_loaded = dotenv().is_ok();
    pretty_env_logger::init();
    if !dotenv_loaded {
        debug!("No .env file found, using the process environment only");
    }

    let config = Config::from_env();
    info!("Starting equation bot...");

    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.dialogue_db);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db, Json)
        .await?
        .erase();

    info!("App data is kept under {}", config.app_data_dir.display());
    let profiles = Arc::new(Profiles::new(config.app_data_dir));

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::Answering { equation, history }].endpoint(answer)),
    )
    .dependencies(dptree::deps![storage, profiles])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const GREETING_TEXT: &str = "Hi! Answer the equations below. Your answers are saved to a private app data file, press \"Reset\" to delete it.";
const RESET_BUTTON: &str = "Reset";
const ENTER_NUMBER_TEXT: &str = "Please enter a whole number";

fn account(chat_id: ChatId) -> String {
    chat_id.0.to_string()
}

fn reset_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(RESET_BUTTON)]])
}

fn history_text(history: &History) -> String {
    history.entries().join("\n")
}

async fn start(
    bot: Bot,
    dialogue: QuizDialogue,
    profiles: Arc<Profiles>,
    msg: Message,
) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;

    let sync = profiles.sync_for(&account(msg.chat.id));
    let history = match sync.load_history().await {
        Ok(history) => history,
        Err(e) => {
            error!("Unable to load past equations for chat {}: {}", msg.chat.id.0, e);
            History::default()
        }
    };

    if !history.is_empty() {
        bot.send_message(msg.chat.id, format!("Past equations:\n{}", history_text(&history)))
            .await?;
    }

    ask_new_equation(bot, dialogue, msg.chat.id, history).await
}

async fn ask_new_equation(
    bot: Bot,
    dialogue: QuizDialogue,
    chat_id: ChatId,
    history: History,
) -> HandlerResult {
    let equation = Equation::generate(&mut rand::thread_rng());

    bot.send_message(chat_id, equation.question())
        .reply_markup(reset_keyboard())
        .await?;

    dialogue
        .update(State::Answering { equation, history })
        .await?;
    Ok(())
}

async fn answer(
    bot: Bot,
    dialogue: QuizDialogue,
    profiles: Arc<Profiles>,
    (mut equation, mut history): (Equation, History),
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let text = match msg.text().map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => {
            bot.send_message(chat_id, ENTER_NUMBER_TEXT).await?;
            return Ok(());
        }
    };
    let sync = profiles.sync_for(&account(chat_id));

    if text == RESET_BUTTON {
        history.clear();
        match sync.delete_history().await {
            Ok(true) => {
                bot.send_message(chat_id, "Past equations deleted.").await?;
            }
            Ok(false) => {
                bot.send_message(chat_id, "There is nothing saved yet.").await?;
            }
            Err(e) => {
                error!("Unable to delete app data for chat {}: {}", chat_id.0, e);
                bot.send_message(chat_id, "Unable to delete past equations, try again later.")
                    .await?;
            }
        }

        // The current question stays open
        bot.send_message(chat_id, equation.question())
            .reply_markup(reset_keyboard())
            .await?;
        dialogue
            .update(State::Answering { equation, history })
            .await?;
        return Ok(());
    }

    let value: i32 = match text.parse() {
        Ok(value) => value,
        Err(_) => {
            bot.send_message(chat_id, ENTER_NUMBER_TEXT).await?;
            return Ok(());
        }
    };

    equation.set_answer(value)?;
    history.record(&equation)?;
    bot.send_message(chat_id, history_text(&history)).await?;

    match sync.save_history(&history).await {
        Ok(SaveOutcome::Created(id)) => {
            info!("Created app data file {} for chat {}", id, chat_id.0);
        }
        Ok(SaveOutcome::Updated(id)) => {
            debug!("Updated app data file {} for chat {}", id, chat_id.0);
        }
        Err(e) => {
            error!("Unable to save app data for chat {}: {}", chat_id.0, e);
            bot.send_message(chat_id, "Unable to save your answers, they are only kept in this chat for now.")
                .await?;
        }
    }

    ask_new_equation(bot, dialogue, chat_id, history).await
}
