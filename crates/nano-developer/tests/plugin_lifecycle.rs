//! End-to-end plugin lifecycle: ready, command routing, shutdown handoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use nano_backup::BackupConfig;
use nano_commands::ShutdownSignal;
use nano_developer::{
    DeveloperPlugin, PluginConfig, PluginDeps, ProcessSpawner, ShutdownError,
};
use nano_host::{
    Channel, ChannelId, ChatTransport, Guild, GuildId, GuildStore, HostError, IncomingMessage,
    Member, MetricsSink, Outgoing, PluginHost, Translations, User, UserId,
};

const OWNER: UserId = UserId(1);

type CallLog = Arc<Mutex<Vec<&'static str>>>;

struct FakeTransport {
    sent: Mutex<Vec<(ChannelId, Outgoing)>>,
    presence: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl FakeTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            presence: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, out)| match out {
                Outgoing::Text(t) => t.clone(),
                Outgoing::Rich { text, embed } => {
                    text.clone().unwrap_or_else(|| embed.title.clone())
                }
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(&self, channel: ChannelId, content: Outgoing) -> Result<(), HostError> {
        self.sent.lock().unwrap().push((channel, content));
        Ok(())
    }

    async fn change_presence(&self, text: &str) -> Result<(), HostError> {
        self.presence.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn change_shard_presence(&self, _shard: u64, text: &str) -> Result<(), HostError> {
        self.presence.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn shard_ids(&self) -> Vec<u64> {
        vec![0, 1]
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn leave_guild(&self, guild: GuildId) -> Result<(), HostError> {
        Err(HostError::UnknownGuild(guild))
    }

    async fn logout(&self) -> Result<(), HostError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn guilds(&self) -> Vec<Guild> {
        Vec::new()
    }

    async fn guild(&self, _id: GuildId) -> Option<Guild> {
        None
    }

    async fn default_channel(&self, _guild: GuildId) -> Option<Channel> {
        None
    }

    async fn user(&self, _id: UserId) -> Option<User> {
        None
    }

    async fn members_of(&self, _guild: GuildId) -> Vec<Member> {
        Vec::new()
    }
}

struct LoggingStore {
    log: CallLog,
}

#[async_trait]
impl GuildStore for LoggingStore {
    async fn guild_data(&self, _guild: GuildId) -> Result<Option<serde_json::Value>, HostError> {
        Ok(None)
    }

    async fn retain_guilds(&self, _live: &[GuildId]) -> Result<usize, HostError> {
        Ok(0)
    }

    async fn flush(&self) -> Result<(), HostError> {
        self.log.lock().unwrap().push("flush");
        Ok(())
    }
}

struct NullPlugins;

#[async_trait]
impl PluginHost for NullPlugins {
    async fn plugin_version(&self, _name: &str) -> Option<String> {
        None
    }

    async fn reload_plugin(&self, _name: &str) -> bool {
        false
    }

    async fn refresh_external_data(&self) -> Result<(), HostError> {
        Ok(())
    }
}

struct KeyTranslations;

#[async_trait]
impl Translations for KeyTranslations {
    fn get(&self, key: &str, locale: &str) -> String {
        format!("{key}:{locale}")
    }

    async fn reload(&self) -> Result<(), HostError> {
        Ok(())
    }
}

struct NullMetrics;

impl MetricsSink for NullMetrics {
    fn increment(&self, _counter: &str) {}
}

struct LoggingSpawner {
    log: CallLog,
}

impl ProcessSpawner for LoggingSpawner {
    fn spawn_replacement(&self) -> Result<(), ShutdownError> {
        self.log.lock().unwrap().push("spawn");
        Ok(())
    }
}

struct Fixture {
    _tmp: TempDir,
    transport: Arc<FakeTransport>,
    log: CallLog,
    plugin: DeveloperPlugin,
}

fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("data.rdb"), b"payload").unwrap();

    let transport = Arc::new(FakeTransport::new());
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));

    let plugin = DeveloperPlugin::new(
        PluginConfig {
            owner: OWNER,
            backup: BackupConfig::new(data_dir, tmp.path().join("backup")),
            statuses: vec!["maintaining".into(), "rotating".into()],
            status_interval: None,
        },
        PluginDeps {
            transport: Arc::clone(&transport) as Arc<dyn ChatTransport>,
            store: Arc::new(LoggingStore { log: Arc::clone(&log) }),
            plugins: Arc::new(NullPlugins),
            translations: Arc::new(KeyTranslations),
            metrics: Arc::new(NullMetrics),
            spawner: Box::new(LoggingSpawner { log: Arc::clone(&log) }),
        },
    )
    .unwrap();

    Fixture {
        _tmp: tmp,
        transport,
        log,
        plugin,
    }
}

fn owner_message(content: &str) -> IncomingMessage {
    IncomingMessage {
        content: content.to_string(),
        author: OWNER,
        channel: ChannelId(500),
        guild: Some(GuildId(10)),
        mentions: Vec::new(),
    }
}

#[tokio::test]
async fn restart_flow_flushes_before_respawning() {
    let fixture = fixture();
    fixture.plugin.on_ready();

    let signal = fixture
        .plugin
        .on_message(&owner_message("!nano.restart"), "!", "en")
        .await
        .unwrap();
    assert_eq!(signal, Some(ShutdownSignal::Restart));
    assert_eq!(fixture.plugin.shutdown_signal(), Some(ShutdownSignal::Restart));

    tokio::time::timeout(Duration::from_secs(5), fixture.plugin.on_shutdown())
        .await
        .expect("shutdown hung")
        .unwrap();

    assert_eq!(*fixture.log.lock().unwrap(), vec!["flush", "spawn"]);
    assert!(fixture.transport.is_closed());
}

#[tokio::test]
async fn exit_flow_does_not_respawn() {
    let fixture = fixture();
    fixture.plugin.on_ready();

    let signal = fixture
        .plugin
        .on_message(&owner_message("!nano.kill"), "!", "en")
        .await
        .unwrap();
    assert_eq!(signal, Some(ShutdownSignal::Exit));

    tokio::time::timeout(Duration::from_secs(5), fixture.plugin.on_shutdown())
        .await
        .expect("shutdown hung")
        .unwrap();

    assert_eq!(*fixture.log.lock().unwrap(), vec!["flush"]);
}

#[tokio::test]
async fn host_shutdown_without_command_still_flushes() {
    let fixture = fixture();
    fixture.plugin.on_ready();

    tokio::time::timeout(Duration::from_secs(5), fixture.plugin.on_shutdown())
        .await
        .expect("shutdown hung")
        .unwrap();

    assert_eq!(*fixture.log.lock().unwrap(), vec!["flush"]);
}

#[tokio::test]
async fn non_owner_command_is_denied() {
    let fixture = fixture();

    let message = IncomingMessage {
        author: UserId(99),
        ..owner_message("!nano.kill")
    };
    let signal = fixture.plugin.on_message(&message, "!", "en").await.unwrap();

    assert_eq!(signal, None);
    assert_eq!(fixture.plugin.shutdown_signal(), None);
    assert_eq!(fixture.transport.sent_texts(), vec!["PERM_OWNER:en"]);
}

#[tokio::test]
async fn ready_starts_shard_labelled_presence_rotation() {
    let fixture = fixture();
    fixture.plugin.on_ready();

    // The roller updates every shard once before its first sleep.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if fixture.transport.presence.lock().unwrap().len() >= 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("no presence updates observed");

    let presence = fixture.transport.presence.lock().unwrap().clone();
    assert!(presence[0].ends_with("| shard 1"), "got {:?}", presence[0]);
    assert!(presence[1].ends_with("| shard 2"), "got {:?}", presence[1]);

    fixture.plugin.on_ready(); // second call is a no-op

    tokio::time::timeout(Duration::from_secs(5), fixture.plugin.on_shutdown())
        .await
        .expect("shutdown hung")
        .unwrap();
}
