use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Short user-facing message (toast)
#[derive(Event, Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Registers `Notice` and echoes every notice to the log
pub struct NoticePlugin;

impl Plugin for NoticePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Notice>()
            .add_systems(Last, log_notices);
    }
}

fn log_notices(mut notices: EventReader<Notice>) {
    for notice in notices.read() {
        match notice.level {
            NoticeLevel::Error => warn!("[notice] {}", notice.message),
            NoticeLevel::Success => info!("[notice] {}", notice.message),
        }
    }
}
