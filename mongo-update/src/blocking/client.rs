use std::fmt::Display;
use std::sync::Arc;
use std::thread;

use mongodb::results::UpdateResult;

use crate::query::{self, Command};
use crate::r#async;
use crate::update::UpdateRequest;

/// A `ClientBuilder` can be used to create a blocking `Client` with custom configuration.
///
/// It accepts the same configuration as the async [`ClientBuilder`](crate::ClientBuilder).
///
/// # Example
///
/// ```no_run
/// # fn doc() -> Result<(), mongo_update::Error> {
/// let _client = mongo_update::blocking::Client::builder()
///     .uri("mongodb://127.0.0.1:27017/?w=majority")
///     .database("app")
///     .auth("foo", Some("bar"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ClientBuilder {
    builder: r#async::ClientBuilder,
}

impl ClientBuilder {
    /// Constructs a new `ClientBuilder`.
    ///
    /// This is the same as `Client::builder()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a `Client` built from this `ClientBuilder` configuration.
    ///
    /// # Errors
    ///
    /// This method fails if the runtime thread cannot be started or the `mongodb::Client`
    /// cannot be initialised.
    pub fn build(self) -> crate::Result<Client> {
        Ok(Client {
            inner: Arc::new(ClientInner::new(self, None)?),
        })
    }

    /// Sets the username/password that should be used by this client.
    pub fn auth<U, P>(mut self, username: U, password: Option<P>) -> Self
    where
        U: Display,
        P: Display,
    {
        self.builder = self.builder.auth(username, password);
        self
    }

    /// Sets the CA file that should be used by this client for TLS.
    pub fn ca<I: Into<String>>(mut self, path: I) -> Self {
        self.builder = self.builder.ca(path);
        self
    }

    /// Sets the certificate file that should be used by this client for identification.
    pub fn cert_key<I: Into<String>>(mut self, path: I) -> Self {
        self.builder = self.builder.cert_key(path);
        self
    }

    /// Sets the database that should be used by this client.
    pub fn database<I: Into<String>>(mut self, database: I) -> Self {
        self.builder = self.builder.database(database);
        self
    }

    /// Sets the uri that this client should use to connect to a mongo instance.
    pub fn uri<I: Into<String>>(mut self, uri: I) -> Self {
        self.builder = self.builder.uri(uri);
        self
    }
}

/// A synchronous `Client` to send update requests with.
///
/// The client uses sane defaults but these can be tweaked using the builder. To configure a
/// `Client`, use `Client::builder`.
///
/// Requests are executed on a dedicated thread running a single threaded runtime, the `Client`
/// can be cloned and shared between threads.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

type Request = (Command, OneshotResponse);
type OneshotResponse = std::sync::mpsc::Sender<crate::Result<UpdateResult>>;
type ThreadSender = tokio::sync::mpsc::UnboundedSender<Request>;

struct ClientInner {
    _thread: Option<thread::JoinHandle<()>>,
    tx: ThreadSender,
}

impl Client {
    /// Constructs a new `Client`.
    ///
    /// # Panics
    ///
    /// This method panics if the `mongodb::Client` fails to initialise.
    ///
    /// Use `Client::builder()` if you wish to handle this failure as an `Error` instead of
    /// panicking.
    pub fn new() -> Self {
        ClientBuilder::new().build().expect("Client::new()")
    }

    /// Creates a `ClientBuilder` to configure a `Client`.
    ///
    /// This is the same as `ClientBuilder::new()`.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Constructs a new `Client` using a `mongodb::Client`.
    pub fn from_client<I: Into<String>>(
        client: mongodb::Client,
        database: I,
    ) -> crate::Result<Self> {
        Ok(Self {
            inner: Arc::new(ClientInner::new(
                ClientBuilder::new(),
                Some(r#async::Client::from_client(client, database)),
            )?),
        })
    }

    /// Convenience method to send an update request to a collection.
    ///
    /// Use [`query::Update`](crate::query::Update) to set further driver options.
    ///
    /// # Errors
    ///
    /// This method fails if the request is empty or the mongodb encountered an error.
    pub fn update<I: Into<String>>(
        &self,
        collection: I,
        request: &UpdateRequest,
    ) -> crate::Result<UpdateResult> {
        query::Update::new(collection).blocking(self, request)
    }

    pub(crate) fn execute(&self, command: Command) -> crate::Result<UpdateResult> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.inner
            .tx
            .send((command, tx))
            .map_err(|_| crate::error::runtime("failed to send request to blocking thread"))?;
        rx.recv().map_err(crate::error::runtime)?
    }
}

impl ClientInner {
    fn new(builder: ClientBuilder, client: Option<r#async::Client>) -> crate::Result<Self> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let (spawn_tx, spawn_rx) = std::sync::mpsc::channel::<crate::Result<()>>();
        let handle = thread::Builder::new()
            .name("mongo-update-blocking-runtime".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(crate::error::builder)
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        if let Err(e) = spawn_tx.send(Err(e)) {
                            error!("failed to communicate runtime builder: {:?}", e);
                        }
                        return;
                    }
                };
                let f = async move {
                    let client = match client {
                        Some(client) => client,
                        None => match builder.builder.build() {
                            Ok(client) => client,
                            Err(e) => {
                                if let Err(e) = spawn_tx.send(Err(e)) {
                                    error!("failed to create async client: {:?}", e);
                                }
                                return;
                            }
                        },
                    };
                    if let Err(e) = spawn_tx.send(Ok(())) {
                        error!("failed to communicate successful startup: {:?}", e);
                        return;
                    }
                    let database = client.database();
                    while let Some((command, resp_tx)) = rx.recv().await {
                        let resp = command.execute(database.clone()).await;
                        if resp_tx.send(resp).is_err() {
                            debug!("blocking caller went away before its update completed");
                        }
                    }
                };
                rt.block_on(f);
            })
            .map_err(crate::error::builder)?;

        spawn_rx.recv().map_err(crate::error::builder)??;

        Ok(Self {
            _thread: Some(handle),
            tx,
        })
    }
}
