use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter, Error, ErrorKind, Result};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::configs::PackConfiguration;
use crate::processor::Calculation;
use crate::protocol::Command;

// Requests are single short lines; anything longer is refused and the
// connection dropped since the rest of the line cannot be resynchronised.
pub(crate) const MAX_LINE_SIZE: usize = 1024;

#[derive(Debug)]
pub(crate) struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    buffer: Vec<u8>,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream) -> Connection {
        let (reader, writer) = stream.into_split();
        Connection {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            buffer: Vec::with_capacity(128),
        }
    }

    /// Reads the next command. `Ok(None)` means the peer closed the connection.
    ///
    /// A malformed line is reported as `InvalidData` and fully consumed, so the
    /// caller may answer it and keep reading. An overlong line is reported as
    /// `InvalidInput`.
    pub(crate) async fn read_command(&mut self) -> Result<Option<Command>> {
        read_command(&mut self.reader, &mut self.buffer).await
    }

    pub(crate) async fn write_packs(&mut self, config: &PackConfiguration) -> Result<()> {
        let mut line = format!("PACKS {}", config.signature);
        for size in config.pack_sizes.iter() {
            line.push(' ');
            line.push_str(&size.to_string());
        }
        self.write_response(line.as_bytes()).await
    }

    pub(crate) async fn write_plan(&mut self, calc: &Calculation) -> Result<()> {
        let header = format!(
            "PLAN {} {} {} {}\r\n",
            calc.order_quantity,
            calc.plan.total_items(),
            calc.plan.total_packs(),
            calc.cached as u8
        );
        self.writer.write_all(header.as_bytes()).await?;
        for pack in calc.plan.iter() {
            self.writer
                .write_all(format!("PACK {} {}\r\n", pack.size, pack.quantity).as_bytes())
                .await?;
        }
        self.write_response(b"END").await
    }

    pub(crate) async fn write_response(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

async fn read_command<R: AsyncBufRead + Unpin>(r: &mut R, buf: &mut Vec<u8>) -> Result<Option<Command>> {
    buf.clear();
    let len = r.take(MAX_LINE_SIZE as u64).read_until(b'\n', buf).await?;
    if len == 0 {
        return Ok(None);
    }
    if buf[len - 1] != b'\n' {
        if len == MAX_LINE_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "line too long"));
        }
        // peer went away mid-line
        return Ok(None);
    }
    if len < 2 || buf[len - 2] != b'\r' {
        return Err(Error::new(ErrorKind::InvalidData, "command not terminated with CRLF"));
    }
    parse_command(&buf[..len - 2]).map(Some)
}

fn invalid(msg: &str) -> Error {
    Error::new(ErrorKind::InvalidData, msg.to_string())
}

fn read_int(field: &str, value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| Error::new(ErrorKind::InvalidData, format!("invalid {}: {}", field, value)))
}

fn parse_command(line: &[u8]) -> Result<Command> {
    let line = std::str::from_utf8(line).map_err(|_| invalid("malformed command"))?;
    let mut parts = line.split_ascii_whitespace();
    let command = parts.next().ok_or_else(|| invalid("missing command"))?;

    let command = match command {
        "get_packs" => Command::GetPacks,
        "quit" => Command::Quit,
        "set_packs" => {
            let sizes = parts
                .by_ref()
                .map(|part| read_int("pack size", part))
                .collect::<Result<Vec<_>>>()?;
            Command::SetPacks { sizes }
        }
        "calculate" => {
            let order = parts.next().ok_or_else(|| invalid("missing order quantity"))?;
            Command::Calculate {
                order: read_int("order quantity", order)?,
            }
        }
        _ => return Err(invalid("unrecognised command")),
    };

    if parts.next().is_some() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("malformed {} command", command.name()),
        ));
    }
    Ok(command)
}
