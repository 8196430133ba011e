mod quiz;

use std::sync::Arc;

use dotenv::dotenv;
use quiz::session::{SessionState, UiEvent, DEFAULT_SUBJECT};
use quiz::store::CorpusStore;
use quiz::view;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatId, KeyboardButton, KeyboardMarkup, MessageId},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveSubject,
    Browse {
        session: SessionState,
    },
}

type SessionStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    dotenv().expect("Failed to load .env file");

    pretty_env_logger::init();
    log::info!("Starting corpus quiz bot...");

    let bot = Bot::from_env();

    println!("Establishing connection to the database...");
    let storage: SessionStorage = SqliteStorage::open("db.sqlite", Json)
        .await
        .expect("Failed to open db.sqlite")
        .erase();
    println!("Connection established");

    let corpus_dir = std::env::var("CORPUS_DIR").unwrap_or_else(|_| ".".to_string());
    let store = Arc::new(CorpusStore::new(corpus_dir));

    // A broken corpus file should be visible at startup, not on first use.
    match store.load(DEFAULT_SUBJECT) {
        Ok(corpus) => println!(
            "Corpus {} loaded, {} topics",
            DEFAULT_SUBJECT,
            corpus.chunks.len()
        ),
        Err(err) => log::warn!("corpus {} is not loadable yet: {}", DEFAULT_SUBJECT, err),
    }

    let store_for_subject = store.clone();
    let store_for_topic = store.clone();
    let store_for_events = store;

    Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(
                Update::filter_message()
                    .enter_dialogue::<Message, ErasedStorage<State>, State>()
                    .branch(dptree::case![State::Start].endpoint(start))
                    .branch(dptree::case![State::ReceiveSubject].endpoint(
                        move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                            receive_subject(store_for_subject.clone(), bot, dialogue, msg)
                        },
                    ))
                    .branch(dptree::case![State::Browse { session }].endpoint(
                        move |bot: Bot,
                              dialogue: QuizDialogue,
                              session: SessionState,
                              msg: Message| {
                            receive_topic(store_for_topic.clone(), bot, dialogue, session, msg)
                        },
                    )),
            )
            .branch(
                Update::filter_callback_query()
                    .enter_dialogue::<CallbackQuery, ErasedStorage<State>, State>()
                    .branch(dptree::case![State::Browse { session }].endpoint(
                        move |bot: Bot,
                              dialogue: QuizDialogue,
                              session: SessionState,
                              q: CallbackQuery| {
                            handle_event(store_for_events.clone(), bot, dialogue, session, q)
                        },
                    )),
            ),
    )
    .dependencies(dptree::deps![storage])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "¡Hola! Soy el bot de trivia. Elige un temario para empezar:";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let keyboard = KeyboardMarkup::new(vec![vec![KeyboardButton::new(DEFAULT_SUBJECT)]]);
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(keyboard)
        .await?;

    dialogue.update(State::ReceiveSubject).await?;
    Ok(())
}

async fn receive_subject(
    store: Arc<CorpusStore>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    let subject = match msg.text() {
        Some(text) => text,
        None => {
            bot.send_message(msg.chat.id, "Por favor, elige un temario con el teclado")
                .await?;
            return Ok(());
        }
    };
    if subject != DEFAULT_SUBJECT {
        let keyboard = KeyboardMarkup::new(vec![vec![KeyboardButton::new(DEFAULT_SUBJECT)]]);
        bot.send_message(msg.chat.id, "Ese temario no existe, elige uno de la lista")
            .reply_markup(keyboard)
            .await?;
        return Ok(());
    }

    let corpus = match store.load(subject) {
        Ok(corpus) => corpus,
        Err(err) => {
            log::error!("failed to load corpus {}: {}", subject, err);
            bot.send_message(
                msg.chat.id,
                format!("No pude cargar el temario {}: {}", subject, err),
            )
            .await?;
            return Ok(());
        }
    };

    let session = SessionState::new(subject, &corpus);
    send_topic_keyboard(&bot, msg.chat.id, &corpus).await?;

    dialogue.update(State::Browse { session }).await?;
    Ok(())
}

async fn send_topic_keyboard(bot: &Bot, chat: ChatId, corpus: &quiz::Corpus) -> HandlerResult {
    let rows = view::topic_labels(corpus)
        .into_iter()
        .map(|label| vec![KeyboardButton::new(label)])
        .collect::<Vec<_>>();
    bot.send_message(chat, "Elige un tema")
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn receive_topic(
    store: Arc<CorpusStore>,
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: SessionState,
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text,
        None => {
            bot.send_message(msg.chat.id, "Por favor, elige un tema con el teclado")
                .await?;
            return Ok(());
        }
    };

    let corpus = match store.load(&session.subject) {
        Ok(corpus) => corpus,
        Err(err) => {
            log::error!("failed to load corpus {}: {}", session.subject, err);
            bot.send_message(
                msg.chat.id,
                format!("No pude cargar el temario {}: {}", session.subject, err),
            )
            .await?;
            return Ok(());
        }
    };
    session.ensure_responses(&corpus);

    let labels = view::topic_labels(&corpus);
    let topic = match labels.iter().position(|label| label == text) {
        Some(topic) => topic,
        None => {
            send_topic_keyboard(&bot, msg.chat.id, &corpus).await?;
            return Ok(());
        }
    };
    session.select_topic(topic)?;

    // One message per question, each carrying its own answer keyboard.
    let chunk = &corpus.chunks[topic];
    bot.send_message(msg.chat.id, format!("Tema: {}", chunk.title))
        .await?;
    for qn in 0..chunk.questions.len() {
        let card = view::render_card(&corpus, &session, topic, qn)?;
        let sent = bot
            .send_message(msg.chat.id, view::card_text(&card))
            .reply_markup(view::card_keyboard(&card))
            .await?;
        session.record_card(topic, qn, sent.id.0);
    }

    dialogue.update(State::Browse { session }).await?;
    Ok(())
}

async fn handle_event(
    store: Arc<CorpusStore>,
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: SessionState,
    q: CallbackQuery,
) -> HandlerResult {
    // Stops the button spinner even when nothing below changes.
    bot.answer_callback_query(q.id.clone()).await?;

    let data = match q.data.as_deref() {
        Some(data) => data,
        None => return Ok(()),
    };

    let corpus = match store.load(&session.subject) {
        Ok(corpus) => corpus,
        Err(err) => {
            log::error!("failed to load corpus {}: {}", session.subject, err);
            bot.send_message(
                dialogue.chat_id(),
                format!("No pude cargar el temario {}: {}", session.subject, err),
            )
            .await?;
            return Ok(());
        }
    };

    let event = UiEvent::decode(data)?;
    let dirty = session.apply(event)?;

    for (topic, question) in dirty {
        let message_id = match session.card(topic, question) {
            Some(id) => id,
            // Card is not on screen; it renders fresh when next shown.
            None => continue,
        };
        let card = view::render_card(&corpus, &session, topic, question)?;
        bot.edit_message_text(
            dialogue.chat_id(),
            MessageId(message_id),
            view::card_text(&card),
        )
        .reply_markup(view::card_keyboard(&card))
        .await?;
    }

    dialogue.update(State::Browse { session }).await?;
    Ok(())
}
