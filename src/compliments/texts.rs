//! Bot-facing text: configurable captions and composed replies.

use crate::compliments::command::{
    ADD, ADMIN, CHANGE_BUTTON_TEXT, CHANGE_USAGE_TEXT, CLEAR_ADMIN, REMOVE_LAST_ADDED, SHOW,
};
use crate::compliments::cooldown::minutes_noun;

pub const DEFAULT_BUTTON_TEXT: &str = "Комплиментик для красотки";
pub const DEFAULT_USAGE_TEXT: &str =
    "Тебе нужно нажать кнопочку которая есть на клавиатуре и будет счастье :)";

pub const NO_COMPLIMENTS: &str = "Комплименты закончились, но скоро появятся новые!";
pub const INVALID_TEXT: &str =
    "Нельзя устанавливать пустые строки и строки которые начинаются с '/'";
pub const UNAUTHORIZED: &str = "Эта команда доступна только админу";
pub const ADMIN_TAKEN: &str = "Админ уже назначен";
pub const REMOVED_LAST: &str = "Успешно удалён последний добавленный комплимент";
pub const NOTHING_TO_REMOVE: &str = "Нечего удалять :С";
pub const STORAGE_FAULT: &str = "Не получилось сохранить изменения, попробуйте ещё раз позже";

/// The two strings the admin may change at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotText {
    pub button: String,
    pub usage: String,
}

impl Default for BotText {
    fn default() -> Self {
        Self {
            button: DEFAULT_BUTTON_TEXT.to_string(),
            usage: DEFAULT_USAGE_TEXT.to_string(),
        }
    }
}

pub fn cooldown_wait(minutes: u64) -> String {
    format!(
        "Следующий комплимент будет доступен через {minutes} {} \u{2764}",
        minutes_noun(minutes)
    )
}

/// Stock notification sent to the admin after a dispatch.
pub fn remaining_stock(count: usize) -> String {
    if count == 0 {
        "❗️❗️❗️Осталось 0 комплиментов!❗️❗️❗️\nУ вас час чтоб добавить их, иначе кто знает что будет..."
            .to_string()
    } else {
        format!("Осталось комплиментов: {count}!")
    }
}

pub fn added(compliment: &str, count: usize) -> String {
    format!("\"{compliment}\" успешно добавлен, теперь их {count} в запасе!")
}

pub fn listing(compliments: &[String]) -> String {
    if compliments.is_empty() {
        return "Комплиментов в запасе нет".to_string();
    }
    format!("Вот все комплименты которые остались:\n{}", compliments.join("\n"))
}

pub fn admin_menu(text: &BotText, count: usize) -> String {
    [
        "Доступные команды для админа:".to_string(),
        format!("{CHANGE_BUTTON_TEXT} новый текст - изменить текст кнопки (сейчас {})", text.button),
        format!("{CHANGE_USAGE_TEXT} новый текст - изменить текст сообщения (сейчас {})", text.usage),
        format!("{ADD} новый комплимент - добавить новый комплимент (сейчас осталось комплиментов: {count})"),
        format!("{REMOVE_LAST_ADDED} - удаляет последний добавленный комплимент"),
        format!("{SHOW} - посмотреть все оставшиеся комплименты"),
        format!("{CLEAR_ADMIN} - удаляем данные об админе. Можно заново назначить командой {ADMIN}"),
        format!("Так же при выполнении команды {ADMIN} - ваш ID запомнился для оповещения об оставшихся комплиментах."),
    ]
    .join("\n")
}

pub fn admin_cleared() -> String {
    format!("Админ успешно удалён! Можете заново его переназначить командой {ADMIN}")
}

pub fn button_changed(button: &str) -> String {
    format!("Новый текст для кнопки успешно установлен на {button}")
}

pub fn usage_changed(usage: &str) -> String {
    format!("Новый текст сообщения успешно установлен на {usage}")
}
