use std::io::{stdout, Read, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ch10::{PacketStream, Summary};
use handlebars::handlebars_helper;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    summary: Summary,
}

fn summarize<R: Read + Seek>(stream: &mut PacketStream<R>, fpath: &Path) -> Result<Info> {
    let mut summary = Summary::default();
    for zult in stream.headers([]) {
        let header = zult.context("reading packet headers")?;
        summary.add(&header);
    }
    debug!(
        packets = summary.count,
        bytes = summary.bytes,
        "summarized {fpath:?}"
    );

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        summary,
    })
}

pub fn info<R: Read + Seek>(
    stream: &mut PacketStream<R>,
    fpath: &Path,
    format: &Format,
) -> Result<()> {
    let info = summarize(stream, fpath)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn pad(num: u64, v: &serde_json::Value, left: bool) -> String {
    let v = match v {
        serde_json::Value::String(s) => s.to_owned(),
        serde_json::Value::Null => String::new(),
        _ => v.to_string(),
    };
    let num = usize::try_from(num).unwrap_or(0).max(v.len());
    let padding = " ".repeat(num - v.len());
    if left {
        padding + &v
    } else {
        v + &padding
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| pad(num, v, true));
    handlebars_helper!(right_pad: |num: u64, v: Json| pad(num, v, false));
    handlebars_helper!(type_name: |code: u64| {
        u8::try_from(code).map_or(ch10::datatype::UNDEFINED, ch10::datatype::name)
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_helper("rpad", Box::new(right_pad));
    hb.register_helper("type_name", Box::new(type_name));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("compiling text template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================
Packets:  {{ summary.count }}
Bytes:    {{ summary.bytes }}
Missing:  {{ summary.missing }}
-------------------------------------------------------------------------------
{{ #each summary.data_types }}Data Type {{ rpad 24 name }} Counts = {{ count }}
{{/each }}-------------------------------------------------------------------------------
Channel  Data Type                    Count         Bytes   Missing
-------------------------------------------------------------------------------
{{ #each summary.channels }}{{ lpad 7 @key }}  {{ rpad 24 (type_name data_type) }}  {{ lpad 9 count }}  {{ lpad 12 bytes }}  {{ lpad 8 missing }}
{{/each }}";
