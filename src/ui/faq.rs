use serde::Serialize;

/// FAQ 条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqItem {
    pub question: &'static str,
    pub answer: &'static str,
}

static FAQ_ITEMS: [FaqItem; 4] = [
    FaqItem {
        question: "このアプリはどんなアプリですか？",
        answer: "小説や文学作品を縦書きで快適に読めるように設計されたリーディングアプリです。ページごとに進行し、アンロック機能で順番に読めるようになっています。",
    },
    FaqItem {
        question: "ページが『■』で隠れているのはなぜですか？",
        answer: "ロック中のページだからです。物語を進めると自動的にアンロックされ、本文が表示されます。",
    },
    FaqItem {
        question: "ページを進めたり戻ったりするには？",
        answer: "画面左右の『←』『→』ボタンでページを切り替えられます。スマホではスワイプにも対応予定です。",
    },
    FaqItem {
        question: "フォントサイズや余白を変えられますか？",
        answer: "今後のアップデートで調整機能を追加予定です。現在は固定サイズでの表示です。",
    },
];

/// FAQ 手风琴
///
/// 同时最多展开一项；再次点击已展开的项会收起
#[derive(Debug, Clone, Default)]
pub struct FaqAccordion {
    open_index: Option<usize>,
}

impl FaqAccordion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &'static [FaqItem] {
        &FAQ_ITEMS
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open_index
    }

    /// 点击第 `index` 项
    pub fn toggle(&mut self, index: usize) {
        if index >= FAQ_ITEMS.len() {
            return;
        }
        self.open_index = if self.open_index == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    /// 当前展开项的回答
    pub fn open_answer(&self) -> Option<&'static str> {
        self.open_index.map(|i| FAQ_ITEMS[i].answer)
    }
}
