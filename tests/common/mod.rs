#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use motday::error::Error;
use motday::motive::{MotiveMaker, PreparedMotive};
use motday::provider::{Candidate, PhotoIndex, SearchRequest};
use motday::search::{PhotoSearch, SearchOptions, shared_rng};
use motday::selection::SelectedImage;
use motday::themes::{QueryMode, Theme, ThemeStore};

#[derive(Debug, Clone)]
pub enum Reply {
    Page(Vec<Candidate>),
    Fail(&'static str),
}

/// Photo index that answers from a script, then repeats `fallback` forever.
pub struct ScriptedIndex {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl ScriptedIndex {
    pub fn new(script: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new(Vec::new(), reply)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoIndex for ScriptedIndex {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(request.text.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Page(candidates) => Ok(candidates),
            Reply::Fail(message) => Err(Error::Provider {
                code: "105".into(),
                message: message.into(),
            }),
        }
    }
}

pub fn original(url: &str, width: u32, height: u32) -> Candidate {
    Candidate {
        url_o: Some(url.into()),
        width_o: Some(width),
        height_o: Some(height),
        ..Candidate::default()
    }
}

pub fn large(url: &str, width: u32, height: u32) -> Candidate {
    Candidate {
        url_l: Some(url.into()),
        width_l: Some(width),
        height_l: Some(height),
        ..Candidate::default()
    }
}

pub fn bare() -> Candidate {
    Candidate::default()
}

pub fn ocean() -> Theme {
    Theme {
        title: "Ocean".into(),
        descriptions: vec!["Salt and spray".into()],
        queries: vec!["ocean".into(), "sea".into()],
    }
}

pub fn search_over(index: Arc<ScriptedIndex>, retries: u32, seed: u64) -> Arc<PhotoSearch> {
    let options = SearchOptions {
        retries,
        ..SearchOptions::default()
    };
    Arc::new(PhotoSearch::new(index, options, shared_rng(Some(seed))))
}

pub fn maker_over(index: Arc<ScriptedIndex>, themes: Vec<Theme>, seed: u64) -> Arc<MotiveMaker> {
    let rng = shared_rng(Some(seed));
    let search = Arc::new(PhotoSearch::new(index, SearchOptions::default(), rng.clone()));
    Arc::new(MotiveMaker::new(
        Arc::new(ThemeStore::new(themes).unwrap()),
        search,
        QueryMode::Joined,
        rng,
    ))
}

pub fn motive(n: u32) -> PreparedMotive {
    PreparedMotive {
        theme: Arc::new(ocean()),
        query: format!("query-{n}"),
        image: SelectedImage {
            url: format!("https://live.example/{n}.jpg"),
            width: 1600,
            height: 900,
        },
    }
}
