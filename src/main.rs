use std::sync::Arc;

use chatgpt::client::ChatGPT;
use roadmap_mentor_bot::ai_helper::AiHelper;
use roadmap_mentor_bot::config::Config;
use roadmap_mentor_bot::progress::Progress;
use roadmap_mentor_bot::quiz::generator::QuizGenerator;
use roadmap_mentor_bot::quiz::topic::Topic;
use roadmap_mentor_bot::quiz::Quiz;
use roadmap_mentor_bot::telegram::{
    self, MAX_MESSAGE_LEN, PROGRESS_COMMAND, REVIEW_WRITEUP, TAKE_QUIZ,
};
use roadmap_mentor_bot::writeup::WriteUp;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardRemove},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Generator = QuizGenerator<Arc<AiHelper>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveActivityChoice,
    ReceiveQuizTopic,
    Quiz {
        topic: Topic,
        quiz: Quiz,
        replies: Vec<String>,
    },
    ReceiveWriteUp,
}

type DialogueStorage = std::sync::Arc<ErasedStorage<State>>;
/// Progress outlives dialogue resets, so it has its own store keyed by chat.
type ProgressStorage = std::sync::Arc<ErasedStorage<Progress>>;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    pretty_env_logger::init();
    log::info!("Starting roadmap mentor bot...");

    let result = match config {
        Ok(config) => run(config).await,
        Err(err) => Err(err.into()),
    };
    if let Err(err) = result {
        log::error!("Bot stopped: {}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> HandlerResult {
    let bot = Bot::new(&config.telegram_token);

    log::info!(
        "Opening dialogue storage at {}",
        config.database_path.display()
    );
    let storage: DialogueStorage =
        SqliteStorage::open(&config.database_path.to_string_lossy(), Json)
            .await?
            .erase();
    let progress: ProgressStorage =
        SqliteStorage::open(&config.progress_database_path.to_string_lossy(), Json)
            .await?
            .erase();

    let gpt = {
        let mut gpt = ChatGPT::new(&config.chatgpt_api_key)?;

        gpt.config.engine = config.chatgpt_engine;
        gpt.config.timeout = config.chatgpt_timeout;

        gpt
    };

    let ai_helper = Arc::new(AiHelper::new(gpt));
    let generator: Arc<Generator> = Arc::new(QuizGenerator::new(ai_helper.clone()));

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(start))
            .branch(
                dptree::filter(|msg: Message| msg.text() == Some(PROGRESS_COMMAND))
                    .endpoint(show_progress),
            )
            .branch(
                dptree::filter(|msg: Message| msg.text().and_then(telegram::note_command).is_some())
                    .endpoint(save_note),
            )
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(
                dptree::case![State::ReceiveActivityChoice].endpoint(receive_activity_choice),
            )
            .branch(dptree::case![State::ReceiveQuizTopic].endpoint(receive_quiz_topic))
            .branch(dptree::case![State::Quiz { topic, quiz, replies }].endpoint(quiz_step))
            .branch(dptree::case![State::ReceiveWriteUp].endpoint(receive_writeup)),
    )
    .dependencies(dptree::deps![storage, progress, generator, ai_helper])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const GREETING_TEXT: &str = "Hi! I'm your security roadmap mentor. I can quiz you on any topic from your roadmap or review one of your write-ups. Send /progress to see your results so far and /note <text> to keep a note on your latest quiz topic. What would you like to do?";
const QUIZ_FAILED_TEXT: &str = "Failed to generate the quiz. The AI might be busy, please try again in a moment.";
const REVIEW_FAILED_TEXT: &str = "An error occurred while generating suggestions. Please try again later.";

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(telegram::activity_keyboard())
        .await?;

    dialogue.update(State::ReceiveActivityChoice).await?;
    Ok(())
}

async fn receive_activity_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    generator: Arc<Generator>,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    match text {
        TAKE_QUIZ => {
            bot.send_message(
                msg.chat.id,
                "Which topic should the quiz cover? For example: \"SQL injection\" or \"Linux privilege escalation\".",
            )
            .reply_markup(KeyboardRemove::new())
            .await?;
            dialogue.update(State::ReceiveQuizTopic).await?;
        }
        REVIEW_WRITEUP => {
            bot.send_message(
                msg.chat.id,
                "Paste your full write-up in one message and I'll suggest improvements.",
            )
            .reply_markup(KeyboardRemove::new())
            .await?;
            dialogue.update(State::ReceiveWriteUp).await?;
        }
        _ => match telegram::repeated_topic(text) {
            Some(topic) => start_quiz(&bot, &dialogue, msg.chat.id, topic, &generator).await?,
            None => {
                bot.send_message(msg.chat.id, "Please choose one of the options.")
                    .reply_markup(telegram::activity_keyboard())
                    .await?;
            }
        },
    }
    Ok(())
}

async fn receive_quiz_topic(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    generator: Arc<Generator>,
) -> HandlerResult {
    match msg.text() {
        Some(raw_topic) => start_quiz(&bot, &dialogue, msg.chat.id, raw_topic, &generator).await,
        None => {
            bot.send_message(msg.chat.id, "Please send the topic as text.")
                .await?;
            Ok(())
        }
    }
}

async fn start_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    raw_topic: &str,
    generator: &Generator,
) -> HandlerResult {
    let topic = match Topic::parse(raw_topic) {
        Ok(topic) => topic,
        Err(err) => {
            log::info!("Rejected quiz topic: {}", err);
            bot.send_message(chat_id, "Invalid topic provided. Please send a short topic as text.")
                .await?;
            dialogue.update(State::ReceiveQuizTopic).await?;
            return Ok(());
        }
    };

    // The typing indicator is cosmetic, so a failure here is ignored
    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
    bot.send_message(chat_id, format!("Generating a quiz about {}...", topic))
        .await?;

    match generator.generate(&topic).await {
        Ok(quiz) => {
            // Saved first, so a failed send can't lose the generated quiz.
            dialogue
                .update(State::Quiz {
                    topic,
                    quiz: quiz.clone(),
                    replies: Vec::new(),
                })
                .await?;

            bot.send_message(
                chat_id,
                format!("{}\n\n{} questions, good luck!", quiz.title(), quiz.len()),
            )
            .await?;
            send_question(bot, chat_id, &quiz, 0).await?;
        }
        Err(err) => {
            log::error!("Quiz about {:?} failed: {}", topic.as_str(), err);
            bot.send_message(chat_id, QUIZ_FAILED_TEXT)
                .reply_markup(telegram::after_quiz_keyboard(topic.as_str()))
                .await?;

            dialogue.update(State::ReceiveActivityChoice).await?;
        }
    }
    Ok(())
}

/// Every message in a running quiz answers the question sent last.
async fn quiz_step(
    bot: Bot,
    dialogue: QuizDialogue,
    (topic, quiz, mut replies): (Topic, Quiz, Vec<String>),
    msg: Message,
    progress: ProgressStorage,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let question = match quiz.question(replies.len()) {
        Some(question) => question,
        None => {
            return finish_quiz(&bot, &dialogue, &progress, chat_id, &topic, &quiz, &replies).await
        }
    };

    let reply = msg.text().map(str::trim).unwrap_or_default();
    let choices = telegram::choices(question);
    if !choices.is_empty() && !choices.contains(&reply) {
        bot.send_message(chat_id, "Please pick one of the options.")
            .reply_markup(telegram::options_keyboard(question))
            .await?;
        return Ok(());
    }

    let feedback = telegram::answer_feedback(question, reply);
    replies.push(reply.to_string());

    if replies.len() >= quiz.len() {
        bot.send_message(chat_id, feedback).await?;
        return finish_quiz(&bot, &dialogue, &progress, chat_id, &topic, &quiz, &replies).await;
    }

    let next = replies.len();
    dialogue
        .update(State::Quiz {
            topic,
            quiz: quiz.clone(),
            replies,
        })
        .await?;

    bot.send_message(chat_id, feedback).await?;
    send_question(&bot, chat_id, &quiz, next).await
}

async fn send_question(bot: &Bot, chat_id: ChatId, quiz: &Quiz, idx: usize) -> HandlerResult {
    let question = match quiz.question(idx) {
        Some(question) => question,
        None => return Ok(()),
    };

    let question_text = format!("Question {}/{}:\n{}", idx + 1, quiz.len(), question.text());
    if telegram::choices(question).is_empty() {
        bot.send_message(
            chat_id,
            format!(
                "{}\n\n(No options were generated for this one, send anything to skip it.)",
                question_text
            ),
        )
        .reply_markup(KeyboardRemove::new())
        .await?;
    } else {
        bot.send_message(chat_id, question_text)
            .reply_markup(telegram::options_keyboard(question))
            .await?;
    }
    Ok(())
}

async fn finish_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    progress: &ProgressStorage,
    chat_id: ChatId,
    topic: &Topic,
    quiz: &Quiz,
    replies: &[String],
) -> HandlerResult {
    let score = quiz.score(replies);
    log::info!(
        "Chat {} finished quiz {:?} with {}/{}",
        chat_id.0,
        quiz.title(),
        score,
        quiz.len()
    );

    dialogue.update(State::ReceiveActivityChoice).await?;
    // Losing one result is better than withholding the score from the user.
    if let Err(err) = record_result(progress, chat_id, topic, score, quiz.len()).await {
        log::error!("Could not save progress for chat {}: {}", chat_id.0, err);
    }

    bot.send_message(
        chat_id,
        format!(
            "Quiz complete! You scored {} / {}.\nWhat would you like to do next?",
            score,
            quiz.len()
        ),
    )
    .reply_markup(telegram::after_quiz_keyboard(topic.as_str()))
    .await?;
    Ok(())
}

async fn load_progress(
    progress: &ProgressStorage,
    chat_id: ChatId,
) -> Result<Progress, Box<dyn std::error::Error + Send + Sync>> {
    let saved = progress.clone().get_dialogue(chat_id).await?;
    Ok(saved.unwrap_or_default())
}

async fn record_result(
    progress: &ProgressStorage,
    chat_id: ChatId,
    topic: &Topic,
    score: usize,
    total: usize,
) -> HandlerResult {
    let mut record = load_progress(progress, chat_id).await?;
    record.record_result(topic, score, total);
    progress.clone().update_dialogue(chat_id, record).await?;
    Ok(())
}

/// Works in every state and leaves the dialogue where it was.
async fn show_progress(bot: Bot, msg: Message, progress: ProgressStorage) -> HandlerResult {
    let record = load_progress(&progress, msg.chat.id).await?;
    for chunk in telegram::split_message(&record.summary(), MAX_MESSAGE_LEN) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

async fn save_note(bot: Bot, msg: Message, progress: ProgressStorage) -> HandlerResult {
    let text = msg.text().and_then(telegram::note_command).unwrap_or_default();
    let mut record = load_progress(&progress, msg.chat.id).await?;

    let reply = match record.set_note(text) {
        Ok(topic) => format!("Saved your note for {}.", topic),
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };
    progress.update_dialogue(msg.chat.id, record).await?;

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn receive_writeup(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    ai_helper: Arc<AiHelper>,
) -> HandlerResult {
    let writeup = match msg.text().map(WriteUp::parse) {
        Some(Ok(writeup)) => writeup,
        Some(Err(err)) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
        None => {
            bot.send_message(msg.chat.id, "Please paste the write-up as text.")
                .await?;
            return Ok(());
        }
    };

    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    match ai_helper.review_writeup(&writeup).await {
        Ok(suggestions) => {
            for chunk in telegram::split_message(&suggestions, MAX_MESSAGE_LEN) {
                bot.send_message(msg.chat.id, chunk).await?;
            }
            bot.send_message(msg.chat.id, "Anything else?")
                .reply_markup(telegram::activity_keyboard())
                .await?;
        }
        Err(err) => {
            log::error!("Write-up review failed: {}", err);
            bot.send_message(msg.chat.id, REVIEW_FAILED_TEXT)
                .reply_markup(telegram::activity_keyboard())
                .await?;
        }
    }

    dialogue.update(State::ReceiveActivityChoice).await?;
    Ok(())
}
