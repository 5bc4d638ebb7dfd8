use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "style-finder")]
#[command(about = "写真をカタログと照合して最も似た画像を探すツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像をカタログと照合
    Match {
        /// 画像ファイルのパス、またはURL（--url指定時）
        #[arg(required = true)]
        source: String,

        /// SOURCEをURLとして取得
        #[arg(long)]
        url: bool,

        /// カタログJSONファイル
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// ONNXモデルファイル
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// 上位K件を表示
        #[arg(short, long)]
        top: Option<usize>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 画像をBase64と特徴ベクトルに変換
    Encode {
        /// 画像ファイルのパス、またはURL（--url指定時）
        #[arg(required = true)]
        source: String,

        /// SOURCEをURLとして取得
        #[arg(long)]
        url: bool,

        /// ONNXモデルファイル
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// フォルダ内の画像を一括照合
    Batch {
        /// 画像フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// カタログJSONファイル
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// ONNXモデルファイル
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// 出力JSONファイル（デフォルト: 入力フォルダ/matches.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// キャッシュを使用（再推論をスキップ）
        #[arg(long)]
        use_cache: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },

    /// 設定を表示/編集
    Config {
        /// モデルファイルを設定
        #[arg(long)]
        set_model: Option<PathBuf>,

        /// カタログファイルを設定
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
