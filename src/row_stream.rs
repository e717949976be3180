use std::boxed::Box;
use std::cell::UnsafeCell;
use std::error::Error;
use std::io;
use std::marker::PhantomPinned;
use std::pin::Pin;
use std::task::{Context, Poll};

use actix_web::web::Bytes;
use futures::stream::BoxStream;
use futures::Stream;
use log::debug;
use serde::Serialize;
use sqlx::{Database, FromRow, Sqlite, SqlitePool};

/// Rows of a query, each serialized as one line of JSON.
///
/// The stream owns the pool handle and the SQL text that the inner query
/// stream borrows, so it can be handed to a response body as `'static`.
pub struct RowStream<'s, R> {
    // Fields drop in declaration order: `stream` borrows `pool` and `sql`
    // and must be dropped before them.
    stream: Option<BoxStream<'s, Result<R, sqlx::Error>>>,
    pool: UnsafeCell<SqlitePool>,
    sql: UnsafeCell<Pin<String>>,
    limit: u32,
    buf: Vec<u8>,
    _pinned: PhantomPinned,
}

impl<'s, R> RowStream<'s, R>
where
    R: for<'r> FromRow<'r, <Sqlite as Database>::Row> + Send + Unpin + 's,
{
    /// `sql` takes a single `?` parameter, bound to `limit`.
    pub fn new(pool: &'_ SqlitePool, sql: &str, limit: u32) -> Pin<Box<RowStream<'s, R>>> {
        debug!("RowStream::new(limit = {})", limit);
        let wrapped = RowStream {
            stream: None,
            pool: UnsafeCell::new(pool.clone()),
            sql: UnsafeCell::new(Pin::new(String::from(sql))),
            limit,
            buf: Vec::new(),
            _pinned: PhantomPinned,
        };
        let mut wrapped = Box::pin(wrapped);

        // Safety: the pool is our own clone (an Arc around the shared pool
        // state) and is dropped only after `stream`, which is declared first. Neither it nor the SQL
        // text is moved or mutated after this point.
        let pool = unsafe { &*wrapped.pool.get() };
        // Safety: same as pool
        let sql = unsafe { &**wrapped.sql.get() };
        let stream: BoxStream<'s, Result<R, sqlx::Error>> = Box::pin(
            sqlx::query_as::<Sqlite, R>(sql)
                .bind(wrapped.limit)
                .fetch(pool),
        );

        // Safety: no reference to the new value has been handed out yet, so
        // exclusive access is sound.
        unsafe {
            let mut_ref = Pin::get_unchecked_mut(wrapped.as_mut());
            mut_ref.stream = Some(stream);
        }

        wrapped
    }
}

impl<'s, R> Stream for RowStream<'s, R>
where
    R: Serialize,
{
    type Item = Result<Bytes, Box<dyn Error>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Safety: only `stream` and `buf` are touched; the pinned pool and
        // SQL text it borrows are never moved.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(stream) = &mut this.stream {
            match stream.as_mut().poll_next(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Some(Ok(row))) => {
                    if let Err(e) = serde_json::to_writer(&mut this.buf, &row) {
                        this.buf.clear();
                        return Poll::Ready(Some(Err(Box::new(e))));
                    }
                    this.buf.push(b'\n');

                    let poll = Poll::Ready(Some(Ok(Bytes::copy_from_slice(&this.buf))));
                    this.buf.clear();
                    poll
                }
                Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(Box::new(e)))),
                Poll::Ready(None) => Poll::Ready(None),
            }
        } else {
            Poll::Ready(Some(Err(Box::new(io::Error::new(
                io::ErrorKind::Other,
                "RowStream: expected stream to be Some",
            )))))
        }
    }
}
