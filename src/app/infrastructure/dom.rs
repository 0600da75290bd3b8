//! A minimal in-memory document tree.
//!
//! Elements form a tree through `children`. A frame element owns a nested
//! [`Document`], and lookups never cross into it, so each document is an
//! isolated scope the way an embedded browsing context is.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::app::error::{EditorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Body,
    Div,
    Frame,
    Button,
}

#[derive(Debug)]
pub struct Element {
    tag: Tag,
    id: Option<String>,
    classes: Vec<String>,
    title: Option<String>,
    hidden: Cell<bool>,
    inner_html: RefCell<String>,
    children: RefCell<Vec<Rc<Element>>>,
    content_document: Option<Rc<Document>>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            title: None,
            hidden: Cell::new(false),
            inner_html: RefCell::new(String::new()),
            children: RefCell::new(Vec::new()),
            content_document: None,
        }
    }

    /// A frame hosting its own document.
    pub fn frame(document: Rc<Document>) -> Self {
        Self {
            content_document: Some(document),
            ..Self::new(Tag::Frame)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn into_rc(self) -> Rc<Element> {
        Rc::new(self)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
    }

    pub fn inner_html(&self) -> String {
        self.inner_html.borrow().clone()
    }

    pub fn set_inner_html(&self, html: &str) {
        let mut current = self.inner_html.borrow_mut();
        current.clear();
        current.push_str(html);
    }

    pub fn content_document(&self) -> Option<Rc<Document>> {
        self.content_document.clone()
    }

    pub fn append_child(&self, child: Rc<Element>) {
        self.children.borrow_mut().push(child);
    }

    /// Remove `child` by identity. Returns false if it was not a direct child.
    pub fn remove_child(&self, child: &Rc<Element>) -> bool {
        let mut children = self.children.borrow_mut();
        match children.iter().position(|c| Rc::ptr_eq(c, child)) {
            Some(idx) => {
                children.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn children(&self) -> Vec<Rc<Element>> {
        self.children.borrow().clone()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Element>> {
        for child in self.children.borrow().iter() {
            if child.id() == Some(id) {
                return Some(child.clone());
            }
            if let Some(found) = child.get_element_by_id(id) {
                return Some(found);
            }
        }
        None
    }

    pub fn get_elements_by_tag_name(&self, tag: Tag) -> Vec<Rc<Element>> {
        self.collect(&|el| el.tag == tag)
    }

    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<Rc<Element>> {
        self.collect(&|el| el.has_class(class))
    }

    fn collect(&self, pred: &dyn Fn(&Element) -> bool) -> Vec<Rc<Element>> {
        let mut found = Vec::new();
        for child in self.children.borrow().iter() {
            if pred(child) {
                found.push(child.clone());
            }
            found.extend(child.collect(pred));
        }
        found
    }
}

/// An isolated document: a body element plus linked stylesheets.
#[derive(Debug)]
pub struct Document {
    body: Rc<Element>,
    stylesheets: RefCell<Vec<String>>,
}

impl Document {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            body: Element::new(Tag::Body).into_rc(),
            stylesheets: RefCell::new(Vec::new()),
        })
    }

    pub fn body(&self) -> &Rc<Element> {
        &self.body
    }

    pub fn link_stylesheet(&self, href: impl Into<String>) {
        self.stylesheets.borrow_mut().push(href.into());
    }

    pub fn stylesheets(&self) -> Vec<String> {
        self.stylesheets.borrow().clone()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Element>> {
        self.body.get_element_by_id(id)
    }

    pub fn get_elements_by_tag_name(&self, tag: Tag) -> Vec<Rc<Element>> {
        self.body.get_elements_by_tag_name(tag)
    }

    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<Rc<Element>> {
        self.body.get_elements_by_class_name(class)
    }
}

/// Where the widget mounts: an element, or an id looked up in a host document.
#[derive(Debug, Clone)]
pub enum Container {
    Element(Rc<Element>),
    Lookup { document: Rc<Document>, id: String },
}

impl Container {
    pub fn by_id(document: &Rc<Document>, id: impl Into<String>) -> Self {
        Container::Lookup {
            document: document.clone(),
            id: id.into(),
        }
    }

    pub fn resolve(&self) -> Result<Rc<Element>> {
        match self {
            Container::Element(el) => Ok(el.clone()),
            Container::Lookup { document, id } => document
                .get_element_by_id(id)
                .ok_or_else(|| EditorError::Config(format!("container #{} not found", id))),
        }
    }
}

impl From<Rc<Element>> for Container {
    fn from(el: Rc<Element>) -> Self {
        Container::Element(el)
    }
}
