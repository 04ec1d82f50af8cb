//! Persists the named album → image list map the MJPEG server streams
//! from, in a `<mjpegserverlist version="1.0">` document.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::MjpegError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MjpegAlbumsMap(pub BTreeMap<String, Vec<PathBuf>>);

impl MjpegAlbumsMap {
    pub fn load(path: &Path) -> Result<Self, MjpegError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    pub fn save(&self, path: &Path) -> Result<(), MjpegError> {
        let xml = self.to_xml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, xml)?;
        Ok(())
    }

    fn to_xml(&self) -> Result<String, MjpegError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut root = BytesStart::new("mjpegserverlist");
        root.push_attribute(("version", "1.0"));
        root.push_attribute(("client", "bqm"));
        root.push_attribute(("encoding", "UTF-8"));
        writer.write_event(Event::Start(root))?;

        for (title, paths) in &self.0 {
            let mut album = BytesStart::new("album");
            album.push_attribute(("title", title.as_str()));
            writer.write_event(Event::Start(album))?;

            for path in paths {
                let mut path_el = BytesStart::new("path");
                path_el.push_attribute(("value", path.to_string_lossy().as_ref()));
                writer.write_event(Event::Empty(path_el))?;
            }

            writer.write_event(Event::End(BytesEnd::new("album")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("mjpegserverlist")))?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn from_xml(xml: &str) -> Result<Self, MjpegError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut map = BTreeMap::new();
        let mut current_title: Option<String> = None;
        let mut current_paths: Vec<PathBuf> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"album" => {
                    current_title = None;
                    current_paths = Vec::new();
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"title" {
                            current_title = Some(attr.unescape_value()?.into_owned());
                        }
                    }
                }
                Event::Empty(e) if e.name().as_ref() == b"path" => {
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"value" {
                            current_paths.push(PathBuf::from(attr.unescape_value()?.into_owned()));
                        }
                    }
                }
                Event::End(e) if e.name().as_ref() == b"album" => {
                    if let Some(title) = current_title.take() {
                        map.insert(title, std::mem::take(&mut current_paths));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(MjpegAlbumsMap(map))
    }
}
