use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::http::error::HttpException;
use crate::http::parser::{MessageHead, ParserEvents, RequestParser};
use crate::http::request::{Method, Request};
use crate::http::writer::ResponseWriter;
use crate::web::application::Application;

const READ_CHUNK: usize = 4096;

/// What the parser has reported so far for the request in flight.
#[derive(Debug, Default)]
struct PendingRequest {
    url: Vec<u8>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    head: Option<MessageHead>,
}

impl ParserEvents for PendingRequest {
    fn on_url(&mut self, url: &[u8]) {
        self.url.extend_from_slice(url);
    }

    fn on_header(&mut self, name: &[u8], value: &[u8]) {
        self.headers.push((
            String::from_utf8_lossy(name).to_ascii_lowercase(),
            String::from_utf8_lossy(value).into_owned(),
        ));
    }

    fn on_body(&mut self, body: &[u8]) {
        self.body = Some(Bytes::copy_from_slice(body));
    }

    fn on_message_complete(&mut self, head: MessageHead) {
        self.head = Some(head);
    }
}

impl PendingRequest {
    fn into_request(self, head: MessageHead, app: &Arc<Application>) -> Result<Request, HttpException> {
        let method = Method::from_str(&head.method)
            .ok_or_else(|| HttpException::bad_request(format!("unsupported method {}", head.method)))?;
        let url = String::from_utf8(self.url)
            .map_err(|_| HttpException::bad_request("request target is not valid utf-8"))?;

        let mut builder = Request::builder()
            .method(method)
            .url(url)
            .version(head.version)
            .app(app);

        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = self.body {
            builder = builder.body(body);
        }

        builder.build()
    }
}

/// Bridges one accepted socket to the application.
///
/// Reads until the parser reports a complete message, then hands the
/// request to [`Application::handle`] on a task of its own. The response
/// writer closes the connection once the response is out: one request per
/// connection, no keep-alive.
pub struct Connection<S = TcpStream> {
    stream: S,
    parser: RequestParser,
    pending: PendingRequest,
    app: Arc<Application>,
    runtime: Handle,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(stream: S, app: Arc<Application>, runtime: Handle) -> Self {
        Self {
            stream,
            parser: RequestParser::new(),
            pending: PendingRequest::default(),
            app,
            runtime,
        }
    }

    /// Drives the connection up to the point where its request is handed off.
    ///
    /// Returns the handle of the dispatch task, or `None` when no request
    /// was dispatched (peer went away, or a `400` was written directly).
    pub async fn run(self) -> anyhow::Result<Option<JoinHandle<()>>> {
        let Connection {
            stream,
            mut parser,
            mut pending,
            app,
            runtime,
        } = self;
        let (mut reader, writer) = tokio::io::split(stream);

        let head = match read_message(&mut reader, &mut parser, &mut pending).await? {
            ReadOutcome::Complete(head) => head,
            ReadOutcome::Closed => {
                debug!("Peer closed connection before sending a full request");
                return Ok(None);
            }
            ReadOutcome::Malformed(exc) => {
                reject(writer, exc).await?;
                return Ok(None);
            }
        };

        let request = match pending.into_request(head, &app) {
            Ok(request) => request,
            Err(exc) => {
                reject(writer, exc).await?;
                return Ok(None);
            }
        };

        let task = runtime.spawn(async move {
            app.handle(request, move |response| async move {
                if let Err(e) = ResponseWriter::new(writer).send(&response).await {
                    warn!(error = %e, "Failed to write response");
                }
            })
            .await;
        });

        Ok(Some(task))
    }
}

enum ReadOutcome {
    Complete(MessageHead),
    Closed,
    Malformed(HttpException),
}

async fn read_message<R>(
    reader: &mut ReadHalf<R>,
    parser: &mut RequestParser,
    pending: &mut PendingRequest,
) -> anyhow::Result<ReadOutcome>
where
    R: AsyncRead,
{
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .context("failed to read from connection")?;

        if n == 0 {
            return Ok(ReadOutcome::Closed);
        }

        if let Err(e) = parser.feed(&chunk[..n], pending) {
            warn!(error = %e, "Malformed request");
            return Ok(ReadOutcome::Malformed(HttpException::bad_request(e.to_string())));
        }

        if let Some(head) = pending.head.take() {
            return Ok(ReadOutcome::Complete(head));
        }
    }
}

async fn reject<W>(writer: WriteHalf<W>, exc: HttpException) -> anyhow::Result<()>
where
    W: AsyncWrite,
{
    ResponseWriter::new(writer).send(&exc.to_response()).await?;
    Ok(())
}
